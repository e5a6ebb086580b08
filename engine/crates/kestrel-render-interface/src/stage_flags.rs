use bitflags::bitflags;

bitflags! {
    /// 着色器阶段可见性掩码
    ///
    /// 可见性是 descriptor block key 的一部分：掩码不同的 block
    /// 永远不会互相合并。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESSELLATION_CONTROL = 1 << 1;
        const TESSELLATION_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
        const ALL = Self::VERTEX.bits()
            | Self::TESSELLATION_CONTROL.bits()
            | Self::TESSELLATION_EVALUATION.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits()
            | Self::COMPUTE.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_stage() {
        // ALL 必须包含全部六个阶段
        assert!(ShaderStageFlags::ALL.contains(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT));
        assert!(ShaderStageFlags::ALL.contains(ShaderStageFlags::COMPUTE));
        assert_eq!(ShaderStageFlags::ALL.bits(), 0b11_1111);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(ShaderStageFlags::default().is_empty());
    }
}
