use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::shader_info::ShaderInfo;

/// pass 在所属 stage 内的 phase 标记
///
/// 资产里既可能写数字也可能写字符串；缺省（`PassInfo::phase` 为 `None`）
/// 表示落入所属 stage 的默认 phase。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PassPhase {
    Index(u32),
    Name(String),
}

/// technique 中的单个 pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassInfo {
    /// 引用的 shader 程序名，与 `EffectAsset::shaders` 中的条目对应
    pub program: String,

    /// 所属 phase；缺省落入 stage 的默认 phase
    #[serde(default)]
    pub phase: Option<PassPhase>,
}

/// 渲染技术：pass 的有序列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technique {
    #[serde(default)]
    pub passes: Vec<PassInfo>,
}

/// Effect 资产
///
/// shader 程序的反射数据加上 technique/pass 组织，
/// 是绑定解析的输入，也是解析结果的写回目标。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectAsset {
    pub name: String,

    #[serde(default)]
    pub techniques: Vec<Technique>,

    /// 每个 shader 程序一条反射记录，按 `ShaderInfo::name` 被 pass 引用
    #[serde(default)]
    pub shaders: Vec<ShaderInfo>,
}

impl EffectAsset {
    /// 从 JSON 文本解析 effect 资产
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let asset: Self = serde_json::from_str(json).context("解析 effect 资产 JSON 失败")?;
        Ok(asset)
    }

    /// 按名称查找 shader 的反射数据
    #[inline]
    pub fn find_shader(&self, name: &str) -> Option<&ShaderInfo> {
        self.shaders.iter().find(|s| s.name == name)
    }

    /// 按名称查找 shader 的反射数据（可变）
    #[inline]
    pub fn find_shader_mut(&mut self, name: &str) -> Option<&mut ShaderInfo> {
        self.shaders.iter_mut().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_effect_json() {
        let json = r#"{
            "name": "pipeline/deferred",
            "techniques": [
                {
                    "passes": [
                        { "program": "lighting" },
                        { "program": "bloom-combine", "phase": 2 },
                        { "program": "post-final", "phase": "Queue" }
                    ]
                }
            ],
            "shaders": [
                {
                    "name": "lighting",
                    "blocks": [
                        {
                            "name": "CustomLightingUBO",
                            "members": [ { "name": "light_pos", "type": "Float4" } ]
                        }
                    ],
                    "sampler_textures": [
                        { "name": "gbuffer_albedoMap", "type": "Sampler2D" }
                    ]
                }
            ]
        }"#;

        let asset = EffectAsset::from_json_str(json).unwrap();
        assert_eq!(asset.name, "pipeline/deferred");

        // phase 的三种写法：缺省 / 数字 / 字符串
        let passes = &asset.techniques[0].passes;
        assert_eq!(passes[0].phase, None);
        assert_eq!(passes[1].phase, Some(PassPhase::Index(2)));
        assert_eq!(passes[2].phase, Some(PassPhase::Name("Queue".to_string())));

        let shader = asset.find_shader("lighting").unwrap();
        assert_eq!(shader.blocks[0].name, "CustomLightingUBO");
        assert_eq!(shader.blocks[0].members[0].name, "light_pos");
        // 省略的 count 默认为 1
        assert_eq!(shader.sampler_textures[0].count, 1);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(EffectAsset::from_json_str("{ not json").is_err());
    }
}
