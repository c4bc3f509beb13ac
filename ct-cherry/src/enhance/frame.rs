//! 最终 8-bit 显示帧与其持久化存储.
//!
//! 帧内容是无损的单通道灰度栅格, 交给外部传输/显示层编码;
//! 这里只提供逐像素的无损保存路径 (如 PNG), 便于调试与回归对比.

use image::ImageResult;
use ndarray::{Array2, ArrayView2};
use std::borrow::Cow;
use std::path::Path;

use crate::Idx2d;

/// 表明一个可以 **按原样** 无损持久化的图像对象.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径. 目标格式由扩展名决定,
    /// 应选择无损格式 (如 PNG).
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 渲染管线产出的 8-bit 显示帧. 像素值保证落在 `[0, 255]`,
/// 尺寸为原切片尺寸乘以分辨率放大倍数.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    data: Array2<u8>,
}

impl GrayFrame {
    /// 由归一化平面量化而来. 取值四舍五入并钳制到 `[0, 255]`.
    pub fn from_plane(plane: &Array2<f32>) -> Self {
        Self {
            data: plane.mapv(|v| v.round().clamp(0.0, 255.0) as u8),
        }
    }

    /// 帧的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 获得帧的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得帧的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 获得行优先存储的序列化数据.
    /// 当底层数据本身就是行优先格式时, 可以避免一次 deepcopy.
    pub fn as_row_major_slice(&self) -> Cow<[u8]> {
        if self.data.is_standard_layout() {
            Cow::Borrowed(self.data.as_slice().unwrap())
        } else {
            Cow::Owned(self.data.iter().copied().collect())
        }
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

/// 按原样存储.
impl ImgWriteRaw for GrayFrame {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.data.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_plane_rounds_and_clamps() {
        let mut plane = Array2::<f32>::zeros((2, 2));
        plane[(0, 0)] = 127.5;
        plane[(0, 1)] = -3.0;
        plane[(1, 0)] = 300.0;
        plane[(1, 1)] = 64.4;

        let frame = GrayFrame::from_plane(&plane);
        assert_eq!(frame.data()[(0, 0)], 128);
        assert_eq!(frame.data()[(0, 1)], 0);
        assert_eq!(frame.data()[(1, 0)], 255);
        assert_eq!(frame.data()[(1, 1)], 64);
    }

    #[test]
    fn test_row_major_slice_borrows() {
        let frame = GrayFrame::from_plane(&Array2::from_elem((4, 3), 9.0));
        let slice = frame.as_row_major_slice();
        assert!(matches!(slice, Cow::Borrowed(_)));
        assert_eq!(slice.len(), 12);
    }
}
