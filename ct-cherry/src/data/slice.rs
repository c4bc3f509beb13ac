//! 校准后的二维 HU 切片视图.
//!
//! 校准 (`raw * slope + intercept`) 在 [`crate::CtVolume`] 侧完成,
//! 本模块只关心已处于物理单位 (HU) 的二维平面. 显示链与统计分支都
//! 只读取 HU 平面, 因此这里只提供不可变的借用视图, 以及用于跨调用
//! 传递的拥有所有权的变体.

use crate::Idx2d;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};

/// 不可变、借用的二维校准 HU 切片.
pub struct HuSlice<'a> {
    /// 底层数据的轻量级视图.
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, f32>,
}

impl<'a> HuSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 获取可以迭代切片像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 切片的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 切片的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获得切片的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得切片的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 以行优先规则, 获取能迭代所有 `(索引, HU 值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 克隆自己, 获得一个拥有所有权的切片对象.
    pub fn to_owned(&self) -> OwnedHuSlice {
        OwnedHuSlice {
            data: self.data.to_owned(),
        }
    }
}

impl std::ops::Index<Idx2d> for HuSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 拥有所有权的二维校准 HU 切片.
///
/// `OwnedHuSlice` 仅提供到 `HuSlice` 的轻量转换和底层数据移动,
/// 不提供任何其它方法.
#[derive(Clone, Debug)]
pub struct OwnedHuSlice {
    data: Array2<f32>,
}

impl OwnedHuSlice {
    /// 由底层数据直接构建.
    #[inline]
    pub fn from_raw(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> HuSlice<'_> {
        HuSlice::new(self.data.view())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_read_surface() {
        let data = Array2::from_shape_fn((3, 4), |(h, w)| (h * 4 + w) as f32);
        let owned = OwnedHuSlice::from_raw(data);
        let slice = owned.as_immut();

        assert_eq!(slice.shape(), (3, 4));
        assert_eq!(slice.size(), 12);
        assert_eq!(slice.height(), 3);
        assert_eq!(slice.width(), 4);
        assert_eq!(slice[(1, 2)], 6.0);
        assert_eq!(slice.get((2, 3)), Some(&11.0));
        assert_eq!(slice.get((3, 0)), None);
        assert_eq!(slice.iter().count(), 12);
        assert_eq!(
            slice.indexed_iter().next(),
            Some(((0, 0), &0.0))
        );

        let round = slice.to_owned().into_raw();
        assert_eq!(round, owned.as_immut().data().to_owned());
    }
}
