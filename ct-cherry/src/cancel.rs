//! 协作式取消.
//!
//! 大缓冲上的密度/分辨率增强可能耗时可观. 上层 worker 把令牌传入
//! 渲染调用, 增强循环在分块/行粒度上检查它; 一旦触发, 整个请求以
//! [`RenderError::Cancelled`] 结束, 不产生任何部分结果.

use crate::error::RenderError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// 协作式取消令牌, 可廉价克隆并跨线程共享.
///
/// 令牌由显式标志位和可选 deadline 组成, 两者任一触发即视为取消.
/// 不需要取消语义的调用方使用 [`CancelToken::none`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// 构建永不触发的令牌.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// 以外部共享的标志位构建令牌. 标志位被置为 `true` 后,
    /// 所有持有该令牌的渲染调用会在下一个检查点中止.
    #[inline]
    pub fn with_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            flag: Some(flag),
            deadline: None,
        }
    }

    /// 在 `self` 基础上附加 deadline. 过点后视为取消.
    #[inline]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 查询令牌是否已触发.
    pub fn is_cancelled(&self) -> bool {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Acquire) {
                return true;
            }
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// 检查点: 已触发时返回 `Err(RenderError::Cancelled)`.
    #[inline]
    pub(crate) fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}
