//! 延迟管线的布局
//!
//! Geometry / Lighting / Postprocess 三个主阶段各带一个
//! `"Queue"` phase，后接 TAA 历史累积、Blit 与完整的 bloom 链。
//! 发射前跑一遍自检，发现的问题走 warn 日志，不中断构建。

use kestrel_layout_graph::{
    DescriptorHierarchy, GlobalLayoutFlags, LayoutDiagnostics, LayoutGraphBuilder, VecColorMap, depth_first_search,
    emit_layout_graph,
};
use kestrel_render_interface::{
    DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, ShaderStageFlags, UpdateFrequency,
};

use crate::bloom::{MAX_BLOOM_FILTER_PASSES, add_bloom_chain};

/// TAA 历史累积的阶段数
pub const TAA_STAGE_COUNT: u32 = 3;

/// 声明延迟管线的完整布局并发射到 builder
pub fn build_deferred_layout<B: LayoutGraphBuilder>(out: &mut B) {
    let mut h = DescriptorHierarchy::new();

    h.add_global("default", GlobalLayoutFlags::ALL);
    let mut stage_id = 1;

    // Geometry：gbuffer 写入，材质资源全在逐批次 set，布局层不声明
    let geometry = h.add_render_stage("Geometry", stage_id);
    stage_id += 1;
    let queue = h.add_render_phase("Queue", geometry);
    h.add_shader("deferred-geometry", queue);
    h.merge(queue);
    h.merge(geometry);

    // Lighting：读 gbuffer 四张贴图，外加一个自定义光照 UBO
    let lighting = h.add_render_stage("Lighting", stage_id);
    stage_id += 1;
    let queue = h.add_render_phase("Queue", lighting);
    h.add_shader("deferred-lighting", queue);
    let ubos = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::UniformBuffer,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    let ubo = h.get_uniform_block(SetIndex::GLOBAL, 0, "CustomLightingUBO", ubos);
    h.set_uniform(ubo, "lightColor", ResourceType::Float4, 1);
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    for name in ["gbuffer_albedoMap", "gbuffer_normalMap", "gbuffer_emissiveMap", "gbuffer_posMap"] {
        h.set_descriptor(samplers, name, ResourceType::Float4);
    }
    h.merge(queue);
    h.merge(lighting);

    // Postprocess
    let post = h.add_render_stage("Postprocess", stage_id);
    stage_id += 1;
    let queue = h.add_render_phase("Queue", post);
    h.add_shader("post-process", queue);
    let ubos = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::UniformBuffer,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    let ubo = h.get_uniform_block(SetIndex::MATERIAL, 0, "PostUBO", ubos);
    h.set_uniform(ubo, "texSize", ResourceType::Float4, 1);
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    h.set_descriptor(samplers, "outputResultMap", ResourceType::Float4);
    h.merge(queue);
    h.merge(post);

    // TAA 历史累积
    for i in 0..TAA_STAGE_COUNT {
        let taa = h.add_render_stage(&format!("DeferredTAA{i}"), stage_id);
        stage_id += 1;
        h.add_render_phase("Queue", taa);
        let ubos = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::UniformBuffer,
            ShaderStageFlags::FRAGMENT,
            taa,
        );
        let ubo = h.get_uniform_block(SetIndex::MATERIAL, 0, "TaaUBO", ubos);
        h.set_uniform(ubo, "texSize", ResourceType::Float4, 1);
        let samplers = h.get_layout_block(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
            taa,
        );
        h.set_descriptor(samplers, "inputTexture", ResourceType::Float4);
        h.set_descriptor(samplers, "depthBuffer", ResourceType::Float4);
        h.set_descriptor(samplers, "taaPrevTexture", ResourceType::Float4);
        h.merge(taa);
    }

    // Blit
    let blit = h.add_render_stage("Blit", stage_id);
    stage_id += 1;
    let queue = h.add_render_phase("Queue", blit);
    h.add_shader("blit", queue);
    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        queue,
    );
    h.set_descriptor(samplers, "inputTexture", ResourceType::Sampler2D);
    h.merge(queue);
    h.merge(blit);

    add_bloom_chain(&mut h, MAX_BLOOM_FILTER_PASSES, stage_id);

    // 发射前自检
    let mut colors = VecColorMap::new(h.graph.vertex_count());
    let mut diag = LayoutDiagnostics::new();
    depth_first_search(&h.graph, &mut colors, &mut diag);
    for finding in &diag.findings {
        log::warn!("deferred layout: {finding}");
    }

    emit_layout_graph(&h.graph, out);
}
