use approx::assert_abs_diff_eq;
use pymol_measure::{
    build_adp_matrix, calc_adp_axes, AdpAnalyzer, AnisotropyFilter, AnisouProvider, MeasureError, Nalgebra,
    TensorRecord,
};

struct Structure {
    anisou: Option<Vec<TensorRecord>>,
}

impl AnisouProvider for Structure {
    fn aniso_temp_factors(&self) -> Option<Vec<TensorRecord>> {
        self.anisou.clone()
    }
}

/// Slowly varying tensors, as along a protein backbone
fn chain(n: usize) -> Vec<TensorRecord> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.1;
            [
                0.040 + 0.010 * t.sin(),
                0.025 + 0.005 * t.cos(),
                0.015,
                0.006 * t.cos(),
                -0.003,
                0.002 * t.sin(),
            ]
        })
        .collect()
}

#[test]
fn test_axes_invariants() {
    let _ = env_logger::builder().is_test(true).try_init();
    let records = chain(50);
    let axes = calc_adp_axes(&records, AnisotropyFilter::None).unwrap();
    assert_eq!(axes.len(), 50);
    assert_eq!(axes.to_stacked().len(), 150);
    for (m, v) in axes.axes.iter().zip(&axes.variances) {
        assert!(v[0] >= v[1] && v[1] >= v[2] && v[2] >= 0.0);
        let lengths: Vec<f64> = (0..3)
            .map(|j| (m[0][j] * m[0][j] + m[1][j] * m[1][j] + m[2][j] * m[2][j]).sqrt())
            .collect();
        assert!(lengths[0] >= lengths[1] && lengths[1] >= lengths[2]);
        for j in 0..3 {
            assert_abs_diff_eq!(lengths[j], v[j].sqrt(), epsilon = 1e-10);
        }
    }
}

#[test]
fn test_consecutive_axes_point_the_same_way() {
    let axes = calc_adp_axes(&chain(40), AnisotropyFilter::None).unwrap();
    for pair in axes.axes.windows(2) {
        for j in 0..3 {
            let d: f64 = (0..3).map(|r| pair[0][r][j] * pair[1][r][j]).sum();
            assert!(d >= 0.0, "axis {} flipped between neighbours: {}", j, d);
        }
    }
}

#[test]
fn test_providers_agree_on_magnitudes() {
    let records = chain(20);
    let a = AdpAnalyzer::new().calc_adp_axes(&records, AnisotropyFilter::None).unwrap();
    let b = AdpAnalyzer::with_backend(Nalgebra)
        .calc_adp_axes(&records, AnisotropyFilter::None)
        .unwrap();
    for (va, vb) in a.variances.iter().zip(&b.variances) {
        for k in 0..3 {
            assert_abs_diff_eq!(va[k], vb[k], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_filter_from_keyword_options() {
    let records = vec![[1.0, 1.0, 1.0, 0.0, 0.0, 0.0], [9.0, 0.5, 0.5, 0.0, 0.0, 0.0]];
    let filter = AnisotropyFilter::from_options(Some(0.6), None, None, None).unwrap();
    let axes = calc_adp_axes(&records, filter).unwrap();
    assert_eq!(axes.axes[0], [[0.0; 3]; 3]);
    assert_abs_diff_eq!(axes.axes[1][0][0].abs(), 3.0, epsilon = 1e-12);

    let err = AnisotropyFilter::from_options(None, None, Some(0.0), None).unwrap_err();
    assert!(matches!(err, MeasureError::InvalidParameter { name: "ratio2", .. }));
}

#[test]
fn test_structure_without_anisou() {
    let empty = Structure { anisou: None };
    let err = AdpAnalyzer::new()
        .calc_adp_axes_from(&empty, AnisotropyFilter::None)
        .unwrap_err();
    assert_eq!(err.to_string(), "anisotropic temperature factors are not set");

    let full = Structure { anisou: Some(chain(3)) };
    let axes = AdpAnalyzer::new().calc_adp_axes_from(&full, AnisotropyFilter::None).unwrap();
    assert_eq!(axes.len(), 3);
}

#[test]
fn test_adp_matrix_blocks() {
    let records = chain(4);
    let m = build_adp_matrix(&records);
    assert_eq!(m.dim(), 12);
    for (i, r) in records.iter().enumerate() {
        let block = m.block(i).unwrap();
        assert_eq!(block[0][0], r[0]);
        assert_eq!(block[1][2], r[5]);
        assert_eq!(block[2][0], r[4]);
    }
    assert_eq!(m.get(0, 11), Some(0.0));
}
