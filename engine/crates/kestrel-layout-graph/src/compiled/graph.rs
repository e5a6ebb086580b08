//! 运行期布局图的节点与布局表

use indexmap::IndexMap;
use kestrel_render_interface::{DescriptorTypeOrder, ResourceType, ShaderStageFlags, UpdateFrequency};

use crate::hierarchy::{DescriptorId, LgVertexHandle, UniformBlockDef};

/// set 布局中的单个描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry {
    /// 全图唯一的描述符 id
    pub id: DescriptorId,
    pub ty: ResourceType,
    pub count: u32,
}

/// set 布局中的一段连续 binding 区间
///
/// `offset` 是 block 在所属 set 内的起始 binding，
/// 区间宽度为 `capacity`。
#[derive(Debug, Clone)]
pub struct DescriptorBlockLayout {
    pub descriptor_type: DescriptorTypeOrder,
    pub visibility: ShaderStageFlags,
    pub offset: u32,
    pub capacity: u32,
    pub descriptors: Vec<DescriptorEntry>,
}

/// 单个 descriptor set 的布局
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayout {
    /// 全部 block 的容量之和，即 set 占用的 binding 总数
    pub capacity: u32,
    pub descriptor_blocks: Vec<DescriptorBlockLayout>,
    pub uniform_blocks: IndexMap<String, UniformBlockDef>,
}

/// 按更新频率分组的 set 布局表
#[derive(Debug, Clone, Default)]
pub struct LayoutTable {
    pub sets: IndexMap<UpdateFrequency, DescriptorSetLayout>,
}

impl LayoutTable {
    #[inline]
    pub fn set(&self, freq: UpdateFrequency) -> Option<&DescriptorSetLayout> {
        self.sets.get(&freq)
    }

    #[inline]
    pub fn set_mut(&mut self, freq: UpdateFrequency) -> &mut DescriptorSetLayout {
        self.sets.entry(freq).or_default()
    }

    /// 把 block 追加到对应 set 的末尾，返回分配到的起始 binding
    ///
    /// 偏移是此前所有 block 容量的累计和，只跟追加顺序有关。
    pub fn push_block(&mut self, freq: UpdateFrequency, mut block: DescriptorBlockLayout) -> u32 {
        let set = self.sets.entry(freq).or_default();
        block.offset = set.capacity;
        let offset = block.offset;
        set.capacity += block.capacity;
        set.descriptor_blocks.push(block);
        offset
    }
}

/// phase 下单个 shader 程序的布局快照
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub name: String,
    pub layout: LayoutTable,
}

/// phase 节点附带的程序表
#[derive(Debug, Clone, Default)]
pub struct PhaseNode {
    pub shader_programs: Vec<ShaderProgram>,
    pub shader_index: IndexMap<String, u32>,
}

/// 节点的类型标签
#[derive(Debug, Clone)]
pub enum NodeData {
    RenderStage,
    RenderPhase(PhaseNode),
    Shader,
}

/// 布局图节点
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub name: String,
    pub data: NodeData,
    pub parent: LgVertexHandle,
    pub children: Vec<LgVertexHandle>,
    pub table: LayoutTable,
}

/// 发射完成后的布局图
///
/// 节点以插入顺序存储，句柄即下标；`attribute_index` 把描述符名
/// 映射到全图唯一 id，id 按首次出现顺序分配且之后不变。
#[derive(Debug, Default)]
pub struct CompiledLayoutGraph {
    pub(crate) nodes: Vec<LayoutNode>,
    pub(crate) attribute_index: IndexMap<String, DescriptorId>,
}

// new & init
impl CompiledLayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

// 节点访问
impl CompiledLayoutGraph {
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, handle: LgVertexHandle) -> Option<&LayoutNode> {
        if handle.is_valid() { self.nodes.get(handle.index()) } else { None }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: LgVertexHandle) -> Option<&mut LayoutNode> {
        if handle.is_valid() { self.nodes.get_mut(handle.index()) } else { None }
    }

    /// 按创建顺序遍历全部节点
    pub fn iter(&self) -> impl Iterator<Item = (LgVertexHandle, &LayoutNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (LgVertexHandle::new(i as u32), node))
    }

    /// 在 parent 的直接子节点中按名字查找
    ///
    /// parent 传 INVALID 时在根节点中查找；找不到返回 INVALID。
    pub fn locate_child(&self, parent: LgVertexHandle, name: &str) -> LgVertexHandle {
        if !parent.is_valid() {
            for (handle, node) in self.iter() {
                if !node.parent.is_valid() && node.name == name {
                    return handle;
                }
            }
            return LgVertexHandle::INVALID;
        }

        let Some(p) = self.node(parent) else {
            return LgVertexHandle::INVALID;
        };
        for &child in &p.children {
            if let Some(node) = self.node(child) {
                if node.name == name {
                    return child;
                }
            }
        }
        LgVertexHandle::INVALID
    }

    /// 查找 phase 节点下指定名字的 shader 程序
    pub fn shader_program(&self, phase: LgVertexHandle, name: &str) -> Option<&ShaderProgram> {
        let node = self.node(phase)?;
        let NodeData::RenderPhase(data) = &node.data else {
            return None;
        };
        let slot = *data.shader_index.get(name)?;
        data.shader_programs.get(slot as usize)
    }

    pub(crate) fn add_node(&mut self, name: &str, data: NodeData, parent: LgVertexHandle) -> LgVertexHandle {
        let handle = LgVertexHandle::new(self.nodes.len() as u32);
        self.nodes.push(LayoutNode {
            name: name.to_string(),
            data,
            parent,
            children: Vec::new(),
            table: LayoutTable::default(),
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(handle);
        }
        handle
    }
}

// 描述符 id
impl CompiledLayoutGraph {
    /// 查询描述符名对应的全图 id
    #[inline]
    pub fn descriptor_id(&self, name: &str) -> Option<DescriptorId> {
        self.attribute_index.get(name).copied()
    }

    /// 名字到 id 的完整映射
    #[inline]
    pub fn attribute_index(&self) -> &IndexMap<String, DescriptorId> {
        &self.attribute_index
    }

    /// 取得或分配描述符 id；同名调用永远返回首次分配的 id
    pub(crate) fn register_descriptor(&mut self, name: &str) -> DescriptorId {
        if let Some(id) = self.attribute_index.get(name) {
            return *id;
        }
        let id = DescriptorId(self.attribute_index.len() as u32);
        self.attribute_index.insert(name.to_string(), id);
        id
    }
}

// 调试方法
impl CompiledLayoutGraph {
    /// 以树形结构打印整张布局图
    pub fn print_layout(&self) {
        log::info!("┌─── layout graph: {} nodes, {} descriptors", self.nodes.len(), self.attribute_index.len());
        for (handle, node) in self.iter() {
            if !node.parent.is_valid() {
                self.print_subtree(handle, 1);
            }
        }
        log::info!("└───");
    }

    fn print_subtree(&self, handle: LgVertexHandle, depth: usize) {
        let Some(node) = self.node(handle) else {
            return;
        };
        let indent = "    ".repeat(depth);
        let kind = match &node.data {
            NodeData::RenderStage => "stage",
            NodeData::RenderPhase(_) => "phase",
            NodeData::Shader => "shader",
        };
        log::info!("│{indent}{kind} \"{}\"", node.name);

        for (freq, set) in &node.table.sets {
            log::info!("│{indent}  {freq:?}: {} bindings", set.capacity);
            for block in &set.descriptor_blocks {
                log::info!(
                    "│{indent}    [{}..{}) {:?} {}",
                    block.offset,
                    block.offset + block.capacity,
                    block.descriptor_type,
                    format_visibility(block.visibility)
                );
            }
            for name in set.uniform_blocks.keys() {
                log::info!("│{indent}    uniform block \"{name}\"");
            }
        }

        for &child in &node.children {
            self.print_subtree(child, depth + 1);
        }
    }
}

/// 把可见性掩码格式化成 `VERTEX | FRAGMENT` 形式
pub(crate) fn format_visibility(visibility: ShaderStageFlags) -> String {
    if visibility == ShaderStageFlags::ALL {
        return "ALL".to_string();
    }

    let mut stages: Vec<&str> = Vec::new();
    if visibility.contains(ShaderStageFlags::VERTEX) {
        stages.push("VERTEX");
    }
    if visibility.contains(ShaderStageFlags::TESSELLATION_CONTROL) {
        stages.push("TESSELLATION_CONTROL");
    }
    if visibility.contains(ShaderStageFlags::TESSELLATION_EVALUATION) {
        stages.push("TESSELLATION_EVALUATION");
    }
    if visibility.contains(ShaderStageFlags::GEOMETRY) {
        stages.push("GEOMETRY");
    }
    if visibility.contains(ShaderStageFlags::FRAGMENT) {
        stages.push("FRAGMENT");
    }
    if visibility.contains(ShaderStageFlags::COMPUTE) {
        stages.push("COMPUTE");
    }

    if stages.is_empty() { "NONE".to_string() } else { stages.join(" | ") }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(capacity: u32) -> DescriptorBlockLayout {
        DescriptorBlockLayout {
            descriptor_type: DescriptorTypeOrder::SamplerTexture,
            visibility: ShaderStageFlags::FRAGMENT,
            offset: 0,
            capacity,
            descriptors: Vec::new(),
        }
    }

    #[test]
    fn test_push_block_accumulates_offsets() {
        let mut table = LayoutTable::default();
        assert_eq!(table.push_block(UpdateFrequency::PerPass, block(3)), 0);
        assert_eq!(table.push_block(UpdateFrequency::PerPass, block(2)), 3);
        // 不同频率的 set 各自独立计数
        assert_eq!(table.push_block(UpdateFrequency::PerBatch, block(4)), 0);

        let set = table.set(UpdateFrequency::PerPass).unwrap();
        assert_eq!(set.capacity, 5);
        assert_eq!(set.descriptor_blocks[1].offset, 3);
    }

    #[test]
    fn test_register_descriptor_keeps_first_id() {
        let mut graph = CompiledLayoutGraph::new();
        let a = graph.register_descriptor("albedoMap");
        let b = graph.register_descriptor("normalMap");
        assert_eq!(a.value(), 0);
        assert_eq!(b.value(), 1);
        // 重复注册不挪动 id
        assert_eq!(graph.register_descriptor("albedoMap"), a);
        assert_eq!(graph.descriptor_id("normalMap"), Some(b));
        assert_eq!(graph.descriptor_id("missing"), None);
    }

    #[test]
    fn test_locate_child_roots_and_children() {
        let mut graph = CompiledLayoutGraph::new();
        let stage = graph.add_node("Lighting", NodeData::RenderStage, LgVertexHandle::INVALID);
        let phase = graph.add_node("Queue", NodeData::RenderPhase(PhaseNode::default()), stage);

        assert_eq!(graph.locate_child(LgVertexHandle::INVALID, "Lighting"), stage);
        assert_eq!(graph.locate_child(stage, "Queue"), phase);
        assert!(!graph.locate_child(stage, "missing").is_valid());
        assert!(!graph.locate_child(LgVertexHandle::INVALID, "Queue").is_valid());
    }

    #[test]
    fn test_format_visibility() {
        assert_eq!(format_visibility(ShaderStageFlags::ALL), "ALL");
        assert_eq!(
            format_visibility(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
            "VERTEX | FRAGMENT"
        );
        assert_eq!(format_visibility(ShaderStageFlags::empty()), "NONE");
    }
}
