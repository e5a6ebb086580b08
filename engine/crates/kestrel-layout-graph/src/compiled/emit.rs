//! 布局层级到运行期图的发射

use itertools::{Itertools, izip};

use crate::compiled::graph::{
    CompiledLayoutGraph, DescriptorBlockLayout, DescriptorEntry, NodeData, PhaseNode, ShaderProgram,
};
use crate::hierarchy::{
    DescriptorBlockFlattened, DescriptorBlockIndex, LayoutHierarchy, LgVertexHandle, UniformBlockDef, VertexTag,
};

/// 布局图的发射协议
///
/// [`emit_layout_graph`] 按固定顺序调用这些方法，每个顶点、每个
/// 非空 block 恰好一次。实现方除了 [`CompiledLayoutGraph`] 还可以
/// 是序列化器、统计器等。
pub trait LayoutGraphBuilder {
    /// 清空既有内容，准备接收一次完整发射
    fn clear(&mut self);

    fn add_render_stage(&mut self, name: &str) -> LgVertexHandle;

    fn add_render_phase(&mut self, name: &str, parent: LgVertexHandle) -> LgVertexHandle;

    fn add_shader(&mut self, name: &str, parent: LgVertexHandle);

    /// 追加一个扁平化 block；只会收到 capacity > 0 的 block
    fn add_descriptor_block(
        &mut self,
        vertex: LgVertexHandle,
        index: &DescriptorBlockIndex,
        block: &DescriptorBlockFlattened,
    );

    fn add_uniform_block(
        &mut self,
        vertex: LgVertexHandle,
        index: &DescriptorBlockIndex,
        name: &str,
        uniform_block: &UniformBlockDef,
    );
}

/// 把构建期层级整体发射到 builder
///
/// 顶点按创建顺序处理；每个顶点先建节点（phase 顺带注册 shader），
/// 再按声明顺序发射 capacity > 0 的 block 及其 uniform block。
/// capacity 为 0 的 block 连同其 uniform block 一起跳过。
pub fn emit_layout_graph<B: LayoutGraphBuilder>(hierarchy: &LayoutHierarchy, builder: &mut B) {
    // 库代码也会在没有 profiler 的环境里跑，span 只在 client 存活时记录
    let _span = tracy_client::Client::running()
        .map(|client| client.span(tracy_client::span_location!("layout graph emit"), 0));

    builder.clear();

    let mut mapped = vec![LgVertexHandle::INVALID; hierarchy.vertex_count()];
    for (handle, vertex) in hierarchy.iter() {
        let out = match &vertex.tag {
            VertexTag::RenderStage { .. } => builder.add_render_stage(&vertex.name),
            VertexTag::RenderPhase(info) => {
                let parent = if vertex.parent.is_valid() { mapped[vertex.parent.index()] } else { LgVertexHandle::INVALID };
                let phase = builder.add_render_phase(&vertex.name, parent);
                for shader in &info.shaders {
                    builder.add_shader(shader, phase);
                }
                phase
            }
        };
        mapped[handle.index()] = out;

        for (index, block) in &vertex.descriptors.blocks {
            if block.capacity == 0 {
                continue;
            }
            let flattened = block.flatten();
            builder.add_descriptor_block(out, index, &flattened);
            for (name, uniform_block) in izip!(&flattened.uniform_block_names, &flattened.uniform_blocks) {
                builder.add_uniform_block(out, index, name, uniform_block);
            }
        }
    }

    log::debug!("layout graph emitted: {} vertices", hierarchy.vertex_count());
}

impl LayoutGraphBuilder for CompiledLayoutGraph {
    fn clear(&mut self) {
        self.nodes.clear();
        self.attribute_index.clear();
    }

    fn add_render_stage(&mut self, name: &str) -> LgVertexHandle {
        self.add_node(name, NodeData::RenderStage, LgVertexHandle::INVALID)
    }

    fn add_render_phase(&mut self, name: &str, parent: LgVertexHandle) -> LgVertexHandle {
        self.add_node(name, NodeData::RenderPhase(PhaseNode::default()), parent)
    }

    fn add_shader(&mut self, name: &str, parent: LgVertexHandle) {
        let Some(node) = self.node_mut(parent) else {
            log::warn!("add_shader(\"{name}\"): phase {parent:?} not found, ignored");
            return;
        };
        // 程序快照 phase 当前的布局表；phase 之后新增的 block 会同步追加
        let layout = node.table.clone();
        let NodeData::RenderPhase(phase) = &mut node.data else {
            log::warn!("add_shader(\"{name}\"): {parent:?} is not a render phase, ignored");
            return;
        };
        if phase.shader_index.contains_key(name) {
            return;
        }
        let slot = phase.shader_programs.len() as u32;
        phase.shader_programs.push(ShaderProgram { name: name.to_string(), layout });
        phase.shader_index.insert(name.to_string(), slot);

        self.add_node(name, NodeData::Shader, parent);
    }

    fn add_descriptor_block(
        &mut self,
        vertex: LgVertexHandle,
        index: &DescriptorBlockIndex,
        block: &DescriptorBlockFlattened,
    ) {
        if block.capacity == 0 {
            log::warn!("add_descriptor_block: zero capacity block on {vertex:?}, ignored");
            return;
        }

        let descriptors = izip!(&block.descriptor_names, &block.descriptors)
            .map(|(name, d)| DescriptorEntry {
                id: self.register_descriptor(name),
                ty: d.ty,
                count: d.count,
            })
            .collect_vec();

        let Some(node) = self.node_mut(vertex) else {
            log::warn!("add_descriptor_block: node {vertex:?} not found, ignored");
            return;
        };
        let layout = DescriptorBlockLayout {
            descriptor_type: index.descriptor_type,
            visibility: index.visibility,
            offset: 0,
            capacity: block.capacity,
            descriptors,
        };
        node.table.push_block(index.update_frequency, layout.clone());

        // 同一追加序列，程序表算出的 offset 与节点表一致
        if let NodeData::RenderPhase(phase) = &mut node.data {
            for program in &mut phase.shader_programs {
                program.layout.push_block(index.update_frequency, layout.clone());
            }
        }
    }

    fn add_uniform_block(
        &mut self,
        vertex: LgVertexHandle,
        index: &DescriptorBlockIndex,
        name: &str,
        uniform_block: &UniformBlockDef,
    ) {
        let Some(node) = self.node_mut(vertex) else {
            log::warn!("add_uniform_block(\"{name}\"): node {vertex:?} not found, ignored");
            return;
        };
        node.table
            .set_mut(index.update_frequency)
            .uniform_blocks
            .insert(name.to_string(), uniform_block.clone());

        if let NodeData::RenderPhase(phase) = &mut node.data {
            for program in &mut phase.shader_programs {
                program
                    .layout
                    .set_mut(index.update_frequency)
                    .uniform_blocks
                    .insert(name.to_string(), uniform_block.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kestrel_render_interface::{
        DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, ShaderStageFlags, UpdateFrequency,
    };

    use super::*;
    use crate::hierarchy::DescriptorHierarchy;

    fn sampler_index(visibility: ShaderStageFlags) -> DescriptorBlockIndex {
        DescriptorBlockIndex::new(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            visibility,
        )
    }

    #[test]
    fn test_emit_skips_zero_capacity_blocks() {
        let mut h = DescriptorHierarchy::new();
        let stage = h.add_render_stage("Post", 0);

        // 一个正常声明的 block，一个绕过声明接口、计数从未归一化的 block
        let block = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            stage,
        );
        h.set_descriptor(block, "outputResultMap", ResourceType::Sampler2D);

        let empty = h
            .graph
            .vertex_mut(stage)
            .unwrap()
            .descriptors
            .block_mut(sampler_index(ShaderStageFlags::VERTEX));
        empty.descriptors.insert("ghost".to_string(), crate::hierarchy::Descriptor::new(ResourceType::Sampler2D));
        let mut ub = UniformBlockDef::new(SetIndex::MATERIAL, 0, "GhostUBO");
        ub.set_member("x", ResourceType::Float4, 1);
        empty.uniform_blocks.insert("GhostUBO".to_string(), ub);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);

        let node = compiled.node(compiled.locate_child(LgVertexHandle::INVALID, "Post")).unwrap();
        let set = node.table.set(UpdateFrequency::PerPass).unwrap();
        assert_eq!(set.descriptor_blocks.len(), 1);
        assert_eq!(set.capacity, 1);
        assert!(set.uniform_blocks.is_empty());
        // 被跳过的 block 里的名字也不应拿到 id
        assert_eq!(compiled.descriptor_id("ghost"), None);
        assert!(compiled.descriptor_id("outputResultMap").is_some());
    }

    #[test]
    fn test_emit_assigns_running_offsets() {
        let mut h = DescriptorHierarchy::new();
        let stage = h.add_render_stage("Lighting", 0);

        let samplers = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            stage,
        );
        h.set_descriptor(samplers, "a", ResourceType::Sampler2D);
        h.set_descriptor(samplers, "b", ResourceType::Sampler2D);
        h.set_descriptor(samplers, "c", ResourceType::Sampler2D);

        let ubos = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::UniformBuffer,
            ShaderStageFlags::FRAGMENT,
            stage,
        );
        h.get_uniform_block(SetIndex::GLOBAL, 0, "LightUBO", ubos);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);

        let node = compiled.node(compiled.locate_child(LgVertexHandle::INVALID, "Lighting")).unwrap();
        let set = node.table.set(UpdateFrequency::PerPass).unwrap();
        assert_eq!(set.descriptor_blocks.len(), 2);
        // 声明顺序决定偏移：三个采样器在前，UBO block 从 3 开始
        assert_eq!(set.descriptor_blocks[0].offset, 0);
        assert_eq!(set.descriptor_blocks[1].offset, 3);
        assert_eq!(set.capacity, 4);
        assert!(set.uniform_blocks.contains_key("LightUBO"));
    }

    #[test]
    fn test_emit_assigns_ids_in_first_seen_order() {
        let mut h = DescriptorHierarchy::new();
        let a = h.add_render_stage("A", 0);
        let b = h.add_render_stage("B", 1);

        let block_a = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            a,
        );
        h.set_descriptor(block_a, "first", ResourceType::Sampler2D);
        h.set_descriptor(block_a, "shared", ResourceType::Sampler2D);

        let block_b = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            b,
        );
        h.set_descriptor(block_b, "shared", ResourceType::Sampler2D);
        h.set_descriptor(block_b, "third", ResourceType::Sampler2D);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);

        assert_eq!(compiled.descriptor_id("first").unwrap().value(), 0);
        assert_eq!(compiled.descriptor_id("shared").unwrap().value(), 1);
        assert_eq!(compiled.descriptor_id("third").unwrap().value(), 2);
    }

    #[test]
    fn test_shader_programs_mirror_phase_table() {
        let mut h = DescriptorHierarchy::new();
        let stage = h.add_render_stage("Geometry", 0);
        let phase = h.add_render_phase("Queue", stage);
        h.add_shader("standard", phase);
        h.add_shader("instanced", phase);

        let block = h.get_layout_block(
            UpdateFrequency::PerBatch,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            phase,
        );
        h.set_descriptor(block, "albedoMap", ResourceType::Sampler2D);
        h.set_descriptor(block, "normalMap", ResourceType::Sampler2D);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);

        let stage_node = compiled.locate_child(LgVertexHandle::INVALID, "Geometry");
        let phase_node = compiled.locate_child(stage_node, "Queue");
        let node = compiled.node(phase_node).unwrap();
        let phase_set = node.table.set(UpdateFrequency::PerBatch).unwrap();

        // shader 先于 block 注册，程序表靠同步追加对齐节点表
        for name in ["standard", "instanced"] {
            let program = compiled.shader_program(phase_node, name).unwrap();
            let set = program.layout.set(UpdateFrequency::PerBatch).unwrap();
            assert_eq!(set.capacity, phase_set.capacity);
            assert_eq!(set.descriptor_blocks.len(), phase_set.descriptor_blocks.len());
            assert_eq!(set.descriptor_blocks[0].offset, phase_set.descriptor_blocks[0].offset);
        }
    }

    #[test]
    fn test_emit_clears_previous_content() {
        let mut h = DescriptorHierarchy::new();
        h.add_render_stage("Only", 0);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);
        emit_layout_graph(&h.graph, &mut compiled);

        assert_eq!(compiled.node_count(), 1);
    }

    #[test]
    fn test_emit_preserves_stage_phase_structure() {
        let mut h = DescriptorHierarchy::new();
        let forward = h.add_render_stage("Forward", 0);
        h.add_render_phase("Queue", forward);
        h.add_render_phase("Transparent", forward);
        h.add_render_stage("Post", 1);

        let mut compiled = CompiledLayoutGraph::new();
        emit_layout_graph(&h.graph, &mut compiled);

        let stage = compiled.locate_child(LgVertexHandle::INVALID, "Forward");
        assert!(stage.is_valid());
        assert!(compiled.locate_child(stage, "Queue").is_valid());
        assert!(compiled.locate_child(stage, "Transparent").is_valid());
        assert!(compiled.locate_child(LgVertexHandle::INVALID, "Post").is_valid());
        // 子节点保持创建顺序
        let children = &compiled.node(stage).unwrap().children;
        assert_eq!(compiled.node(children[0]).unwrap().name, "Queue");
        assert_eq!(compiled.node(children[1]).unwrap().name, "Transparent");
    }
}
