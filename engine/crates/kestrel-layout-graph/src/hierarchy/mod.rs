//! 构建期布局层级图
//!
//! stage/phase 两级树，每个顶点挂一张 DescriptorDb。管线脚本通过
//! [`DescriptorHierarchy`] 声明描述符需求，自底向上 merge 之后交给
//! 发射器；层级图本身在发射完成后即可丢弃。
//!
//! # 模块结构
//!
//! - `handle`: 顶点 / block / uniform 句柄
//! - `block`: descriptor block 与结构化 key
//! - `flatten`: block 的平行数组投影
//! - `graph`: 树结构与顶点存储
//! - `builder`: 声明接口与合并算法
//! - `visit`: 深度优先遍历与自检访问器

mod block;
mod builder;
mod flatten;
mod graph;
mod handle;
mod visit;

// Re-exports
pub use block::{Descriptor, DescriptorBlock, DescriptorBlockIndex, DescriptorDb, UniformBlockDef, UniformMember};
pub use builder::{DescriptorHierarchy, GlobalLayoutFlags};
pub use flatten::DescriptorBlockFlattened;
pub use graph::{LayoutHierarchy, LayoutVertex, RenderPhaseInfo, VertexTag};
pub use handle::{DescriptorId, LgBlockHandle, LgUniformHandle, LgVertexHandle};
pub use visit::{GraphColor, LayoutDiagnostics, LayoutVisitor, VecColorMap, VertexColorMap, depth_first_search};
