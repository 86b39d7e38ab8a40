//! # Effect 模块
//!
//! 页面本地状态与作用于其上的效果。
//!
//! ## 设计说明
//!
//! 页面状态是按名字索引的 f32 属性集合（布尔开关用 0.0/1.0 表示），
//! 效果只写入属性值，不回滚。渲染层读取属性值与过渡提示自行插值。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::easing::EasingFunction;
use crate::story::StepId;

/// 过渡提示
///
/// 告诉渲染层如何从旧值过渡到新值，核心不做插值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// 过渡时长（秒）
    pub duration: f32,
    /// 缓动函数
    #[serde(default)]
    pub easing: EasingFunction,
}

impl Transition {
    pub fn new(duration: f32, easing: EasingFunction) -> Self {
        Self { duration, easing }
    }

    pub fn linear(duration: f32) -> Self {
        Self::new(duration, EasingFunction::Linear)
    }

    pub fn ease_in(duration: f32) -> Self {
        Self::new(duration, EasingFunction::EaseIn)
    }

    pub fn ease_out(duration: f32) -> Self {
        Self::new(duration, EasingFunction::EaseOut)
    }

    pub fn ease_in_out(duration: f32) -> Self {
        Self::new(duration, EasingFunction::EaseInOut)
    }

    pub fn spring(duration: f32) -> Self {
        Self::new(duration, EasingFunction::Spring)
    }
}

/// 作用于页面状态的效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Effect {
    /// 设置属性值
    Set {
        property: String,
        value: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transition: Option<Transition>,
    },

    /// 在属性当前值上累加
    Add {
        property: String,
        delta: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transition: Option<Transition>,
    },

    /// 在 0.0 与 1.0 之间翻转
    Toggle {
        property: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transition: Option<Transition>,
    },
}

impl Effect {
    pub fn set(property: impl Into<String>, value: f32) -> Self {
        Self::Set {
            property: property.into(),
            value,
            transition: None,
        }
    }

    pub fn add(property: impl Into<String>, delta: f32) -> Self {
        Self::Add {
            property: property.into(),
            delta,
            transition: None,
        }
    }

    pub fn toggle(property: impl Into<String>) -> Self {
        Self::Toggle {
            property: property.into(),
            transition: None,
        }
    }

    /// 附加过渡提示
    pub fn with_transition(mut self, new: Transition) -> Self {
        match &mut self {
            Self::Set { transition, .. }
            | Self::Add { transition, .. }
            | Self::Toggle { transition, .. } => *transition = Some(new),
        }
        self
    }

    /// 效果作用的属性名
    pub fn property(&self) -> &str {
        match self {
            Self::Set { property, .. } | Self::Add { property, .. } | Self::Toggle { property, .. } => {
                property
            }
        }
    }

    fn transition(&self) -> Option<Transition> {
        match self {
            Self::Set { transition, .. }
            | Self::Add { transition, .. }
            | Self::Toggle { transition, .. } => *transition,
        }
    }
}

/// 页面本地状态
///
/// 每次页面激活时由页面定义中的初始值重新构建。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    /// 属性值
    #[serde(default)]
    properties: BTreeMap<String, f32>,
    /// 每个属性最近一次写入时附带的过渡提示
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    transitions: BTreeMap<String, Transition>,
    /// 每个步骤已触发的次数
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fired: BTreeMap<StepId, u32>,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以初始属性构建
    pub fn with_properties<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, f32)>,
        K: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// 读取属性值
    pub fn value(&self, property: &str) -> Option<f32> {
        self.properties.get(property).copied()
    }

    /// 读取属性值，缺省时返回 `default`
    pub fn value_or(&self, property: &str, default: f32) -> f32 {
        self.value(property).unwrap_or(default)
    }

    /// 以布尔开关读取属性
    pub fn flag(&self, property: &str) -> bool {
        self.value_or(property, 0.0) >= 0.5
    }

    /// 最近一次写入 `property` 时的过渡提示
    pub fn transition(&self, property: &str) -> Option<Transition> {
        self.transitions.get(property).copied()
    }

    /// 步骤已触发的次数
    pub fn fire_count(&self, step: &StepId) -> u32 {
        self.fired.get(step).copied().unwrap_or(0)
    }

    /// 所有步骤的触发次数之和
    pub fn total_fired(&self) -> u32 {
        self.fired.values().sum()
    }

    pub fn properties(&self) -> &BTreeMap<String, f32> {
        &self.properties
    }

    /// 应用效果并记录触发次数
    pub fn apply(&mut self, step: &StepId, effect: &Effect) {
        let property = effect.property().to_string();
        let next = match effect {
            Effect::Set { value, .. } => *value,
            Effect::Add { delta, .. } => self.value_or(&property, 0.0) + delta,
            Effect::Toggle { .. } => {
                if self.flag(&property) {
                    0.0
                } else {
                    1.0
                }
            }
        };
        self.properties.insert(property.clone(), next);

        match effect.transition() {
            Some(transition) => {
                self.transitions.insert(property, transition);
            }
            None => {
                self.transitions.remove(&property);
            }
        }

        *self.fired.entry(step.clone()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_set_add_toggle() {
        let mut state = PageState::with_properties([("offset", -300.0)]);
        let step = StepId::new("s");

        state.apply(&step, &Effect::set("offset", 0.0));
        assert_eq!(state.value("offset"), Some(0.0));

        state.apply(&step, &Effect::add("rotation", 360.0));
        state.apply(&step, &Effect::add("rotation", 360.0));
        assert_eq!(state.value("rotation"), Some(720.0));

        assert!(!state.flag("visible"));
        state.apply(&step, &Effect::toggle("visible"));
        assert!(state.flag("visible"));
        state.apply(&step, &Effect::toggle("visible"));
        assert!(!state.flag("visible"));

        assert_eq!(state.fire_count(&step), 5);
    }

    #[test]
    fn test_transition_recorded_per_write() {
        let mut state = PageState::new();
        let step = StepId::new("fade");

        state.apply(
            &step,
            &Effect::set("alpha", 1.0).with_transition(Transition::ease_in(0.5)),
        );
        assert_eq!(state.transition("alpha"), Some(Transition::ease_in(0.5)));

        // 无过渡的写入清除旧提示
        state.apply(&step, &Effect::set("alpha", 0.0));
        assert_eq!(state.transition("alpha"), None);
    }

    #[test]
    fn test_effect_json_shape() {
        let effect: Effect = serde_json::from_str(
            r#"{"op":"set","property":"show_sweat","value":1.0,"transition":{"duration":0.5,"easing":"ease_in"}}"#,
        )
        .unwrap();
        assert_eq!(
            effect,
            Effect::set("show_sweat", 1.0).with_transition(Transition::ease_in(0.5))
        );

        let toggle: Effect = serde_json::from_str(r#"{"op":"toggle","property":"x"}"#).unwrap();
        assert_eq!(toggle, Effect::toggle("x"));
    }
}
