//! 布局图句柄定义
//!
//! 句柄都是非拥有的弱引用。顶点句柄本质是 `u32` 下标，无效值统一用
//! `INVALID` 哨兵表示；查询接口遇到无效句柄时静默返回未命中，不会 panic。

use std::fmt;

use crate::hierarchy::block::DescriptorBlockIndex;

/// 布局图顶点句柄
///
/// 构建期层级图与编译后布局图共用同一种句柄类型，
/// 但两张图的编号空间互相独立，不能跨图使用。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LgVertexHandle {
    pub(crate) id: u32,
}

impl LgVertexHandle {
    /// 无效顶点哨兵
    ///
    /// 既表示「未找到」，也在 `locate_child` 里表示「根作用域」。
    pub const INVALID: Self = Self { id: u32::MAX };

    #[inline]
    pub(crate) fn new(id: u32) -> Self {
        Self { id }
    }

    /// 顶点编号
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.id != u32::MAX
    }

    /// 以 usize 下标形式访问；无效句柄会落在任何 Vec 的界外
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.id as usize
    }
}

impl Default for LgVertexHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for LgVertexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "LgVertex({})", self.id)
        } else {
            write!(f, "LgVertex(invalid)")
        }
    }
}

/// 指向某个顶点上特定 descriptor block 的句柄
///
/// block 由结构化 key 唯一标识，句柄本身不持有数据；
/// 顶点无效时整个句柄视为无效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LgBlockHandle {
    pub vertex: LgVertexHandle,
    pub index: DescriptorBlockIndex,
}

impl LgBlockHandle {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.vertex.is_valid()
    }
}

/// 指向 block 内某个 uniform block 的句柄
///
/// `slot` 是 uniform block 在所在 block 中的序号；
/// 同名 uniform block 重复获取会得到相同的 slot。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LgUniformHandle {
    pub block: LgBlockHandle,
    pub slot: u32,
}

impl LgUniformHandle {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.block.is_valid() && self.slot != u32::MAX
    }
}

/// 描述符的全局编号
///
/// 由编译后布局图按名字首次出现的顺序分配，
/// 是绑定解析阶段按名字匹配反射记录的 join key。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub(crate) u32);

impl DescriptorId {
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle() {
        let handle = LgVertexHandle::default();
        assert!(!handle.is_valid());
        assert_eq!(handle, LgVertexHandle::INVALID);
        assert_eq!(format!("{handle:?}"), "LgVertex(invalid)");
    }

    #[test]
    fn test_valid_handle_debug() {
        let handle = LgVertexHandle::new(3);
        assert!(handle.is_valid());
        assert_eq!(format!("{handle:?}"), "LgVertex(3)");
    }
}
