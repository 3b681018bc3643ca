//! Short-lived visual adjuncts. They carry no gameplay meaning but live in
//! the simulation so that a renderer and the tick counter agree on them.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Shockwave,
    Afterimage,
    Glitch,
    Spark,
}

#[derive(Clone, Debug, Serialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: u32,
}

impl Effect {
    pub fn at(kind: EffectKind, x: f32, y: f32, life: u32) -> Self {
        Self {
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            life,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Effects {
    items: Vec<Effect>,
}

impl Effects {
    pub fn push(&mut self, effect: Effect) {
        self.items.push(effect);
    }

    /// Ring of sparks flying outward from `(x, y)`.
    pub fn burst(&mut self, x: f32, y: f32, count: usize, speed: f32, life: u32) {
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            self.items.push(Effect {
                kind: EffectKind::Spark,
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life,
            });
        }
    }

    /// Fading copies spaced along a straight line, newest last.
    pub fn trail(&mut self, from: (f32, f32), to: (f32, f32), steps: u32, life: u32) {
        for i in 0..=steps {
            let t = i as f32 / steps.max(1) as f32;
            self.items.push(Effect::at(
                EffectKind::Afterimage,
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
                life.saturating_sub(i * 2),
            ));
        }
    }

    pub fn tick(&mut self) {
        for effect in &mut self.items {
            effect.x += effect.vx;
            effect.y += effect.vy;
            effect.life = effect.life.saturating_sub(1);
        }
        self.items.retain(|effect| effect.life > 0);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.items.iter()
    }
}
