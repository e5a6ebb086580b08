//! 渲染层共享的边界类型
//!
//! 描述符布局子系统与上层渲染管线共用的词汇表：更新频率、根参数类型、
//! 描述符类别、资源类型、着色器阶段可见性掩码，以及描述符集槽位约定。
//!
//! 这个 crate 不依赖任何图形 API，处于引擎分层的最底部。

pub mod descriptors;
pub mod stage_flags;

// Re-exports
pub use descriptors::{DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, UpdateFrequency};
pub use stage_flags::ShaderStageFlags;
