//! Descriptor 布局图
//!
//! 渲染管线在构建期声明 stage/phase 层级与各自的描述符需求；
//! 这个 crate 负责聚合与合并这些声明，把结果发射成运行期只读的
//! 布局表，并在最后把确定下来的 binding 信息写回 shader 反射数据。
//!
//! # 核心概念
//!
//! - **DescriptorHierarchy**: 构建期声明接口，stage/phase 树加每顶点一张 DescriptorDb
//! - **DescriptorBlock / DescriptorBlockIndex**: 聚合的基本单元与其结构化 key
//! - **LayoutGraphBuilder / emit_layout_graph**: 发射协议，层级图到持久图的唯一通道
//! - **CompiledLayoutGraph**: 发射产物，每个顶点持一张按更新频率分组的 set 布局表
//! - **resolve_effect_bindings**: 绑定解析，把可见性与 binding 偏移写回反射记录
//!
//! # 使用示例
//!
//! ```ignore
//! use kestrel_layout_graph::*;
//! use kestrel_render_interface::*;
//!
//! let mut hierarchy = DescriptorHierarchy::new();
//! let stage = hierarchy.add_render_stage("Geometry", 0);
//! let phase = hierarchy.add_render_phase("Queue", stage);
//!
//! let block = hierarchy.get_layout_block(
//!     UpdateFrequency::PerPass,
//!     ParameterType::Table,
//!     DescriptorTypeOrder::SamplerTexture,
//!     ShaderStageFlags::FRAGMENT,
//!     phase,
//! );
//! hierarchy.set_descriptor(block, "mainTexture", ResourceType::Sampler2D);
//! hierarchy.merge(phase);
//!
//! let mut compiled = CompiledLayoutGraph::new();
//! emit_layout_graph(&hierarchy.graph, &mut compiled);
//! compiled.print_layout();
//! ```
//!
//! # 模块结构
//!
//! - `hierarchy`: 构建期层级图（block、句柄、图结构、构建器、遍历）
//! - `compiled`: 编译后布局图与发射器
//! - `binding`: 绑定解析

pub mod binding;
pub mod compiled;
pub mod hierarchy;

// Re-exports
pub use binding::{derive_phase_name, rebind_shader, resolve_effect_bindings};
pub use compiled::{
    CompiledLayoutGraph, DescriptorBlockLayout, DescriptorEntry, DescriptorSetLayout, LayoutGraphBuilder, LayoutNode,
    LayoutTable, NodeData, PhaseNode, ShaderProgram, emit_layout_graph,
};
pub use hierarchy::{
    Descriptor, DescriptorBlock, DescriptorBlockFlattened, DescriptorBlockIndex, DescriptorDb, DescriptorHierarchy,
    DescriptorId, GlobalLayoutFlags, GraphColor, LayoutDiagnostics, LayoutHierarchy, LayoutVertex, LayoutVisitor,
    LgBlockHandle, LgUniformHandle, LgVertexHandle, RenderPhaseInfo, UniformBlockDef, UniformMember, VecColorMap,
    VertexColorMap, VertexTag, depth_first_search,
};
