//! 前向管线的布局
//!
//! 全局描述符 + bloom 链 + 后处理三件套（Postprocess / fxaa / Blit）。
//! Postprocess 只有 stage 没有 phase，effect 里不写 phase 的 pass
//! 会按缺省名 `"Postprocess_"` 去找 phase。

use kestrel_layout_graph::{
    DescriptorHierarchy, GlobalLayoutFlags, LayoutGraphBuilder, emit_layout_graph,
};
use kestrel_render_interface::{
    DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, ShaderStageFlags, UpdateFrequency,
};

use crate::bloom::add_bloom_chain;

/// 声明前向管线的完整布局并发射到 builder
pub fn build_forward_layout<B: LayoutGraphBuilder>(out: &mut B) {
    let mut h = DescriptorHierarchy::new();

    h.add_global("default", GlobalLayoutFlags::ALL);

    // 前向只走两级 bloom
    let mut stage_id = add_bloom_chain(&mut h, 2, 1);

    let post = h.add_render_stage("Postprocess", stage_id);
    stage_id += 1;
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        post,
    );
    h.set_descriptor(samplers, "outputResultMap", ResourceType::Sampler2D);
    h.merge(post);

    let fxaa = h.add_render_stage("fxaa", stage_id);
    stage_id += 1;
    let queue = h.add_render_phase("Queue", fxaa);
    let ubos = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::UniformBuffer,
        ShaderStageFlags::ALL,
        queue,
    );
    let ubo = h.get_uniform_block(SetIndex::MATERIAL, 0, "fxaaUBO", ubos);
    h.set_uniform(ubo, "texSize", ResourceType::Float4, 1);
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    h.set_descriptor(samplers, "sceneColorMap", ResourceType::Sampler2D);
    h.add_shader("fxaa", queue);
    h.merge(queue);
    h.merge(fxaa);

    let blit = h.add_render_stage("Blit", stage_id);
    let queue = h.add_render_phase("Queue", blit);
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    h.set_descriptor(samplers, "inputTexture", ResourceType::Sampler2D);
    h.add_shader("blit", queue);
    h.merge(queue);
    h.merge(blit);

    emit_layout_graph(&h.graph, out);
}

#[cfg(test)]
mod tests {
    use kestrel_layout_graph::{CompiledLayoutGraph, LgVertexHandle, NodeData};

    use super::*;

    #[test]
    fn test_forward_layout_stages() {
        let mut graph = CompiledLayoutGraph::new();
        build_forward_layout(&mut graph);

        for name in [
            "default",
            "Bloom_Prefilter",
            "Bloom_Downsample0",
            "Bloom_Downsample1",
            "Bloom_Upsample0",
            "Bloom_Upsample1",
            "Bloom_Combine",
            "Postprocess",
            "fxaa",
            "Blit",
        ] {
            assert!(
                graph.locate_child(LgVertexHandle::INVALID, name).is_valid(),
                "missing stage {name}"
            );
        }

        // Postprocess 只有 stage
        let post = graph.locate_child(LgVertexHandle::INVALID, "Postprocess");
        assert!(graph.node(post).unwrap().children.is_empty());

        // bloom 各级、fxaa 和 Blit 都带一个 Queue phase
        for name in [
            "Bloom_Prefilter",
            "Bloom_Downsample0",
            "Bloom_Downsample1",
            "Bloom_Upsample0",
            "Bloom_Upsample1",
            "Bloom_Combine",
            "fxaa",
            "Blit",
        ] {
            let stage = graph.locate_child(LgVertexHandle::INVALID, name);
            let queue = graph.locate_child(stage, "Queue");
            assert!(queue.is_valid(), "missing Queue under {name}");
            assert!(matches!(graph.node(queue).unwrap().data, NodeData::RenderPhase(_)));
        }
    }

    #[test]
    fn test_forward_global_stage_bindings() {
        let mut graph = CompiledLayoutGraph::new();
        build_forward_layout(&mut graph);

        let global = graph.locate_child(LgVertexHandle::INVALID, "default");
        let node = graph.node(global).unwrap();
        let set = node.table.set(UpdateFrequency::PerPass).unwrap();

        // 3 个全局 UBO + 5 张全局贴图
        assert_eq!(set.descriptor_blocks.len(), 2);
        assert_eq!(set.capacity, 8);
        assert_eq!(set.descriptor_blocks[0].offset, 0);
        assert_eq!(set.descriptor_blocks[1].offset, 3);
        assert!(set.uniform_blocks.contains_key("GlobalUBO"));
        assert!(set.uniform_blocks.contains_key("CameraUBO"));
        assert!(set.uniform_blocks.contains_key("ShadowUBO"));
    }

    #[test]
    fn test_forward_fxaa_phase_merges_into_stage() {
        let mut graph = CompiledLayoutGraph::new();
        build_forward_layout(&mut graph);

        let fxaa = graph.locate_child(LgVertexHandle::INVALID, "fxaa");
        let node = graph.node(fxaa).unwrap();
        let set = node.table.set(UpdateFrequency::PerPass).unwrap();
        assert!(set.uniform_blocks.contains_key("fxaaUBO"));
        assert_eq!(set.descriptor_blocks[0].visibility, ShaderStageFlags::ALL);

        let ids: Vec<_> = set
            .descriptor_blocks
            .iter()
            .flat_map(|b| &b.descriptors)
            .map(|d| d.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(graph.descriptor_id("fxaaUBO"), Some(ids[0]));
        assert_eq!(graph.descriptor_id("sceneColorMap"), Some(ids[1]));
    }

    #[test]
    fn test_forward_bloom_stage_bindings() {
        let mut graph = CompiledLayoutGraph::new();
        build_forward_layout(&mut graph);

        let stage = graph.locate_child(LgVertexHandle::INVALID, "Bloom_Combine");
        let set = graph.node(stage).unwrap().table.set(UpdateFrequency::PerPass).unwrap();

        // UBO block 在前（ALL），两张采样纹理接在后面（FRAGMENT）
        assert_eq!(set.descriptor_blocks.len(), 2);
        assert_eq!(set.descriptor_blocks[0].visibility, ShaderStageFlags::ALL);
        assert_eq!(set.descriptor_blocks[0].offset, 0);
        assert_eq!(set.descriptor_blocks[1].visibility, ShaderStageFlags::FRAGMENT);
        assert_eq!(set.descriptor_blocks[1].offset, 1);
        assert_eq!(set.capacity, 3);
        assert!(set.uniform_blocks.contains_key("BloomUBO"));
    }

    #[test]
    fn test_forward_blit_samples_input_texture() {
        let mut graph = CompiledLayoutGraph::new();
        build_forward_layout(&mut graph);

        let blit = graph.locate_child(LgVertexHandle::INVALID, "Blit");
        let queue = graph.locate_child(blit, "Queue");
        let set = graph.node(queue).unwrap().table.set(UpdateFrequency::PerPass).unwrap();

        let id = graph.descriptor_id("inputTexture").unwrap();
        assert_eq!(set.descriptor_blocks.len(), 1);
        assert!(set.descriptor_blocks[0].descriptors.iter().any(|d| d.id == id));
    }
}
