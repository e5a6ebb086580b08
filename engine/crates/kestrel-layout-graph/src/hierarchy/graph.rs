//! 层级图的树结构与顶点存储
//!
//! 顶点只增不删，句柄即下标；父子关系用句柄表示，INVALID 表示根。
//! 子顶点列表按创建顺序排列，遍历与发射因此是确定的。

use indexmap::IndexMap;

use crate::hierarchy::block::DescriptorDb;
use crate::hierarchy::handle::LgVertexHandle;

/// render phase 顶点的附加数据
#[derive(Debug, Clone, Default)]
pub struct RenderPhaseInfo {
    /// phase 内注册的 shader 程序名，按注册顺序
    pub shaders: Vec<String>,
    /// shader 名 -> `shaders` 下标
    pub shader_index: IndexMap<String, u32>,
}

impl RenderPhaseInfo {
    /// 注册 shader 程序名；重复注册幂等，返回已有下标
    pub fn add_shader(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.shader_index.get(name) {
            return idx;
        }
        let idx = self.shaders.len() as u32;
        self.shaders.push(name.to_string());
        self.shader_index.insert(name.to_string(), idx);
        idx
    }
}

/// 顶点类别
#[derive(Debug, Clone)]
pub enum VertexTag {
    /// 渲染阶段；`stage_id` 是上层管线给定的阶段标识
    RenderStage { stage_id: u32 },
    /// 阶段内的 phase
    RenderPhase(RenderPhaseInfo),
}

/// 层级图顶点
#[derive(Debug, Clone)]
pub struct LayoutVertex {
    pub name: String,
    pub tag: VertexTag,
    pub parent: LgVertexHandle,
    pub children: Vec<LgVertexHandle>,
    pub descriptors: DescriptorDb,
}

/// 构建期布局层级图
#[derive(Debug, Default)]
pub struct LayoutHierarchy {
    vertices: Vec<LayoutVertex>,
}

impl LayoutHierarchy {
    // new & init

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_vertex(&mut self, name: &str, tag: VertexTag, parent: LgVertexHandle) -> LgVertexHandle {
        let handle = LgVertexHandle::new(self.vertices.len() as u32);
        self.vertices.push(LayoutVertex {
            name: name.to_string(),
            tag,
            parent,
            children: Vec::new(),
            descriptors: DescriptorDb::default(),
        });
        if parent.is_valid() {
            if let Some(p) = self.vertices.get_mut(parent.index()) {
                p.children.push(handle);
            }
        }
        handle
    }

    // tools

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn contains(&self, handle: LgVertexHandle) -> bool {
        handle.is_valid() && handle.index() < self.vertices.len()
    }

    /// 读取顶点；无效句柄返回 None
    #[inline]
    pub fn vertex(&self, handle: LgVertexHandle) -> Option<&LayoutVertex> {
        if self.contains(handle) {
            Some(&self.vertices[handle.index()])
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, handle: LgVertexHandle) -> Option<&mut LayoutVertex> {
        if self.contains(handle) {
            Some(&mut self.vertices[handle.index()])
        } else {
            None
        }
    }

    /// 顶点的子列表；无效句柄返回空
    pub fn children(&self, handle: LgVertexHandle) -> &[LgVertexHandle] {
        self.vertex(handle).map(|v| v.children.as_slice()).unwrap_or(&[])
    }

    /// 按创建顺序遍历 (句柄, 顶点)
    pub fn iter(&self) -> impl Iterator<Item = (LgVertexHandle, &LayoutVertex)> {
        self.vertices.iter().enumerate().map(|(i, v)| (LgVertexHandle::new(i as u32), v))
    }

    /// 在 parent 的子顶点中按名字查找
    ///
    /// parent 传 INVALID 表示在根顶点中查找；未命中返回 INVALID。
    pub fn locate_child(&self, parent: LgVertexHandle, name: &str) -> LgVertexHandle {
        if parent.is_valid() {
            let Some(vertex) = self.vertex(parent) else {
                return LgVertexHandle::INVALID;
            };
            for &child in &vertex.children {
                if self.vertices[child.index()].name == name {
                    return child;
                }
            }
        } else {
            for (handle, vertex) in self.iter() {
                if !vertex.parent.is_valid() && vertex.name == name {
                    return handle;
                }
            }
        }
        LgVertexHandle::INVALID
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_child_in_roots_and_children() {
        let mut graph = LayoutHierarchy::new();
        let stage = graph.add_vertex("Geometry", VertexTag::RenderStage { stage_id: 0 }, LgVertexHandle::INVALID);
        let phase = graph.add_vertex("Queue", VertexTag::RenderPhase(RenderPhaseInfo::default()), stage);

        assert_eq!(graph.locate_child(LgVertexHandle::INVALID, "Geometry"), stage);
        assert_eq!(graph.locate_child(stage, "Queue"), phase);
        assert!(!graph.locate_child(stage, "Missing").is_valid());
        // phase 不是根，根作用域查不到
        assert!(!graph.locate_child(LgVertexHandle::INVALID, "Queue").is_valid());
    }

    #[test]
    fn test_locate_child_with_invalid_parent_handle() {
        let graph = LayoutHierarchy::new();
        // 越界句柄同样安全
        let bogus = LgVertexHandle::new(42);
        assert!(!graph.locate_child(bogus, "anything").is_valid());
    }

    #[test]
    fn test_children_follow_creation_order() {
        let mut graph = LayoutHierarchy::new();
        let stage = graph.add_vertex("S", VertexTag::RenderStage { stage_id: 0 }, LgVertexHandle::INVALID);
        let p0 = graph.add_vertex("P0", VertexTag::RenderPhase(RenderPhaseInfo::default()), stage);
        let p1 = graph.add_vertex("P1", VertexTag::RenderPhase(RenderPhaseInfo::default()), stage);

        assert_eq!(graph.children(stage), &[p0, p1]);
    }

    #[test]
    fn test_shader_registration_is_idempotent() {
        let mut info = RenderPhaseInfo::default();
        assert_eq!(info.add_shader("a"), 0);
        assert_eq!(info.add_shader("b"), 1);
        assert_eq!(info.add_shader("a"), 0);
        assert_eq!(info.shaders, vec!["a", "b"]);
    }
}
