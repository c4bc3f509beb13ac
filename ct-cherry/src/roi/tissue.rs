//! 按 HU 均值分类组织类型.
//!
//! 分类逻辑是一张静态的有序 `(下界, 上界, 标签)` 区间表, 在首次
//! 使用时校验完备性 (覆盖全体实数) 与无重叠 (区间首尾相接),
//! 之后通过线性扫描查表. 区间为左闭右开, 最后一个区间右端为 +∞.
//!
//! 区间边界是工程近似而非生理常量: 真实组织的 HU 分布彼此交叠,
//! 这里只保证任何均值都恰好落入一个区间.

use itertools::Itertools;
use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 组织类型标签.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TissueLabel {
    /// 空气 (约 -1000 HU).
    Air,
    /// 含气肺组织.
    Lung,
    /// 脂肪.
    Fat,
    /// 水样液体.
    Fluid,
    /// 一般软组织.
    SoftTissue,
    /// 肌肉.
    Muscle,
    /// 钙化.
    Calcification,
    /// 致密骨.
    CorticalBone,
    /// 金属植入物.
    Metal,
}

impl TissueLabel {
    /// 标签的英文名.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Lung => "lung",
            Self::Fat => "fat",
            Self::Fluid => "fluid",
            Self::SoftTissue => "soft tissue",
            Self::Muscle => "muscle",
            Self::Calcification => "calcification",
            Self::CorticalBone => "cortical bone",
            Self::Metal => "metal",
        }
    }
}

impl std::fmt::Display for TissueLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个 HU 区间: `[lower, upper)`.
#[derive(Copy, Clone, Debug)]
pub struct TissueBand {
    lower: f64,
    upper: f64,
    label: TissueLabel,
}

impl TissueBand {
    const fn new(lower: f64, upper: f64, label: TissueLabel) -> Self {
        Self {
            lower,
            upper,
            label,
        }
    }

    /// 区间下界 (含).
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// 区间上界 (不含).
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// 区间标签.
    #[inline]
    pub fn label(&self) -> TissueLabel {
        self.label
    }

    /// `value` 是否落入本区间.
    #[inline]
    fn contains(&self, value: f64) -> bool {
        self.lower <= value && value < self.upper
    }
}

/// 原始区间表. 顺序即查找顺序.
const RAW_BANDS: [TissueBand; 9] = [
    TissueBand::new(f64::NEG_INFINITY, -900.0, TissueLabel::Air),
    TissueBand::new(-900.0, -500.0, TissueLabel::Lung),
    TissueBand::new(-500.0, -20.0, TissueLabel::Fat),
    TissueBand::new(-20.0, 20.0, TissueLabel::Fluid),
    TissueBand::new(20.0, 40.0, TissueLabel::SoftTissue),
    TissueBand::new(40.0, 80.0, TissueLabel::Muscle),
    TissueBand::new(80.0, 400.0, TissueLabel::Calcification),
    TissueBand::new(400.0, 1200.0, TissueLabel::CorticalBone),
    TissueBand::new(1200.0, f64::INFINITY, TissueLabel::Metal),
];

/// 启动时校验过的区间表: 覆盖全体实数, 首尾相接, 无重叠.
static BANDS: Lazy<&'static [TissueBand]> = Lazy::new(|| {
    let bands = &RAW_BANDS[..];
    assert_eq!(bands.first().map(|b| b.lower), Some(f64::NEG_INFINITY));
    assert_eq!(bands.last().map(|b| b.upper), Some(f64::INFINITY));
    for band in bands {
        assert!(band.lower < band.upper, "空区间: {band:?}");
    }
    for (cur, next) in bands.iter().tuple_windows() {
        assert_eq!(cur.upper, next.lower, "区间不相接: {cur:?} / {next:?}");
    }
    bands
});

/// 获取校验过的区间表.
#[inline]
pub fn bands() -> &'static [TissueBand] {
    &BANDS
}

/// 按 HU 均值定位组织标签.
///
/// 区间表覆盖全体实数且互不重叠, 因此任何有限均值恰好命中一个区间.
pub fn classify(mean_hu: f64) -> TissueLabel {
    debug_assert!(mean_hu.is_finite());
    bands()
        .iter()
        .find(|b| b.contains(mean_hu))
        .map(|b| b.label)
        .expect("组织区间表覆盖全体实数")
}
