//! 运行期布局图
//!
//! 布局层级发射之后的持久形态：每个节点持有按更新频率分组的
//! descriptor set 布局表，shader 程序各自快照一份所属 phase 的表。
//! 绑定解析只依赖这里的数据，不再回头查构建期层级。
//!
//! # 模块结构
//!
//! - `graph`: 节点存储、布局表与全图描述符 id 注册
//! - `emit`: 发射协议 [`LayoutGraphBuilder`] 与标准发射流程

mod emit;
mod graph;

// Re-exports
pub use emit::{LayoutGraphBuilder, emit_layout_graph};
pub use graph::{
    CompiledLayoutGraph, DescriptorBlockLayout, DescriptorEntry, DescriptorSetLayout, LayoutNode, LayoutTable,
    NodeData, PhaseNode, ShaderProgram,
};
