//! ROI 描述统计.
//!
//! 统计在校准 HU 平面 (物理单位, 未经窗宽窗位) 上进行. 所有数值
//! 字段保证有限: 在会产生 NaN/Infinity 的场合 (空区域, 零均值的
//! 变异系数), 以类型化错误或 `None` 代替.

use super::tissue::{classify, TissueLabel};
use super::RoiMask;
use crate::data::OwnedHuSlice;
use crate::error::RoiError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 95% 置信区间的正态近似分位点.
const Z95: f64 = 1.96;

/// 变异系数在均值绝对值低于该阈值时视为未定义.
const CV_MEAN_EPSILON: f64 = 1e-6;

/// ROI 区域的描述统计与组织分类结果.
///
/// 所有数值字段都是有限的. 持久化由外部测量记录层负责.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiStatistics {
    /// 掩模内的采样个数. 恒大于零.
    pub sample_count: usize,

    /// HU 均值.
    pub mean: f64,

    /// HU 中位数 (线性插值).
    pub median: f64,

    /// 总体标准差.
    pub stddev: f64,

    /// 第 25 百分位数 (线性插值).
    pub p25: f64,

    /// 第 75 百分位数 (线性插值).
    pub p75: f64,

    /// 变异系数 `stddev / |mean|`. 均值接近零时未定义, 取 `None`
    /// 而不是 Infinity.
    pub cv: Option<f64>,

    /// 95% 置信区间下界 (正态近似).
    pub ci95_lower: f64,

    /// 95% 置信区间上界 (正态近似).
    pub ci95_upper: f64,

    /// 按均值查表得到的组织标签.
    pub tissue: TissueLabel,
}

/// 计算掩模覆盖区域的描述统计与组织分类.
///
/// 掩模形状必须与平面一致, 且至少覆盖一个像素; 否则返回类型化错误.
pub fn evaluate(hu: &OwnedHuSlice, mask: &RoiMask) -> Result<RoiStatistics, RoiError> {
    let hu = hu.as_immut();
    if hu.shape() != mask.shape() {
        return Err(RoiError::MaskShapeMismatch {
            mask: mask.shape(),
            frame: hu.shape(),
        });
    }

    let mut samples: Vec<f64> = hu
        .indexed_iter()
        .filter_map(|(pos, &v)| mask.get(pos).unwrap_or(false).then_some(v as f64))
        .collect();
    if samples.is_empty() {
        return Err(RoiError::EmptyRegion);
    }

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let stddev = variance.sqrt();

    samples.sort_unstable_by(f64::total_cmp);
    let median = percentile(&samples, 0.50);
    let p25 = percentile(&samples, 0.25);
    let p75 = percentile(&samples, 0.75);

    let cv = if mean.abs() < CV_MEAN_EPSILON {
        None
    } else {
        Some(stddev / mean.abs())
    };

    let half_interval = Z95 * stddev / (n as f64).sqrt();

    Ok(RoiStatistics {
        sample_count: n,
        mean,
        median,
        stddev,
        p25,
        p75,
        cv,
        ci95_lower: mean - half_interval,
        ci95_upper: mean + half_interval,
        tissue: classify(mean),
    })
}

/// 升序序列的线性插值百分位数. `q` 取 `[0, 1]`.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=1.0).contains(&q));
    let pos = q * (sorted.len() - 1) as f64;
    let base = pos.floor() as usize;
    let frac = pos - base as f64;
    if frac == 0.0 || base + 1 == sorted.len() {
        sorted[base]
    } else {
        sorted[base] + frac * (sorted[base + 1] - sorted[base])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn plane_of(values: &[f64], shape: (usize, usize)) -> OwnedHuSlice {
        let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        OwnedHuSlice::from_raw(Array2::from_shape_vec(shape, data).unwrap())
    }

    fn full_mask(shape: (usize, usize)) -> RoiMask {
        RoiMask::from_raw(Array2::from_elem(shape, true))
    }

    #[test]
    fn test_empty_mask_is_error() {
        let hu = plane_of(&[1.0, 2.0, 3.0, 4.0], (2, 2));
        let mask = RoiMask::from_raw(Array2::from_elem((2, 2), false));
        assert_eq!(evaluate(&hu, &mask), Err(RoiError::EmptyRegion));
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let hu = plane_of(&[1.0, 2.0, 3.0, 4.0], (2, 2));
        let mask = full_mask((2, 3));
        assert!(matches!(
            evaluate(&hu, &mask),
            Err(RoiError::MaskShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_constant_region_collapses() {
        // N 个相同采样: mean = median = v, stddev = 0, CV = 0, CI = [v, v].
        let values = vec![42.0; 16];
        let stats = evaluate(&plane_of(&values, (4, 4)), &full_mask((4, 4))).unwrap();
        assert_eq!(stats.sample_count, 16);
        assert!(float_eq(stats.mean, 42.0));
        assert!(float_eq(stats.median, 42.0));
        assert!(float_eq(stats.stddev, 0.0));
        assert!(float_eq(stats.p25, 42.0));
        assert!(float_eq(stats.p75, 42.0));
        assert_eq!(stats.cv, Some(0.0));
        assert!(float_eq(stats.ci95_lower, 42.0));
        assert!(float_eq(stats.ci95_upper, 42.0));
    }

    #[test]
    fn test_constant_zero_region_cv_undefined() {
        let values = vec![0.0; 9];
        let stats = evaluate(&plane_of(&values, (3, 3)), &full_mask((3, 3))).unwrap();
        assert_eq!(stats.cv, None);
        assert_eq!(stats.tissue, TissueLabel::Fluid);
    }

    #[test]
    fn test_descriptive_statistics() {
        // 1..=8: mean 4.5, 总体 stddev = sqrt(5.25), 分位数线性插值.
        let values: Vec<f64> = (1..=8).map(|v| v as f64).collect();
        let stats = evaluate(&plane_of(&values, (2, 4)), &full_mask((2, 4))).unwrap();
        assert!(float_eq(stats.mean, 4.5));
        assert!(float_eq(stats.median, 4.5));
        assert!(float_eq(stats.p25, 2.75));
        assert!(float_eq(stats.p75, 6.25));
        assert!(float_eq(stats.stddev, 5.25f64.sqrt()));

        let cv = stats.cv.unwrap();
        assert!(float_eq(cv, 5.25f64.sqrt() / 4.5));

        let half = 1.96 * 5.25f64.sqrt() / 8.0f64.sqrt();
        assert!(float_eq(stats.ci95_lower, 4.5 - half));
        assert!(float_eq(stats.ci95_upper, 4.5 + half));
    }

    #[test]
    fn test_air_region_scenario() {
        // 100 个 -950 HU 采样分类为空气/肺类标签.
        let values = vec![-950.0; 100];
        let stats = evaluate(&plane_of(&values, (10, 10)), &full_mask((10, 10))).unwrap();
        assert_eq!(stats.sample_count, 100);
        assert_eq!(stats.tissue, TissueLabel::Air);
        assert!(float_eq(stats.mean, -950.0));
        assert!(float_eq(stats.stddev, 0.0));
    }

    #[test]
    fn test_partial_mask_only_counts_selected() {
        let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let mut mask = Array2::from_elem((4, 4), false);
        mask[(0, 0)] = true; // 0.0
        mask[(3, 3)] = true; // 15.0
        let stats = evaluate(&plane_of(&values, (4, 4)), &RoiMask::from_raw(mask)).unwrap();
        assert_eq!(stats.sample_count, 2);
        assert!(float_eq(stats.mean, 7.5));
        assert!(float_eq(stats.median, 7.5));
    }

    #[test]
    fn test_all_fields_finite() {
        let values: Vec<f64> = (0..64).map(|v| (v * 37 % 97) as f64 - 50.0).collect();
        let stats = evaluate(&plane_of(&values, (8, 8)), &full_mask((8, 8))).unwrap();
        for v in [
            stats.mean,
            stats.median,
            stats.stddev,
            stats.p25,
            stats.p75,
            stats.ci95_lower,
            stats.ci95_upper,
        ] {
            assert!(v.is_finite());
        }
        if let Some(cv) = stats.cv {
            assert!(cv.is_finite());
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_statistics_json_round_trip() {
        let values = vec![-950.0; 4];
        let stats = evaluate(&plane_of(&values, (2, 2)), &full_mask((2, 2))).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"Air\""));
        let back: RoiStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
