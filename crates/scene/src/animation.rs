//! Keyframe animation over scene transforms.
//!
//! A [`Channel`] drives one property of one node from a sorted keyframe
//! track. Sampling clamps to the first and last key outside the track's time
//! range, holds the left key under [`Interpolation::Step`], and blends under
//! [`Interpolation::Linear`]: lerp for translations, slerp for rotations.
//!
//! Animations write straight into node transforms via
//! [`Animation::apply`]; there is no separate pose buffer. Nodes that have
//! disappeared, or never had a transform, are skipped quietly so a running
//! animation survives scene edits.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, Scene, SceneError};

/// How values between two keyframes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Hold the earlier key until the next one starts.
    Step,
    /// Blend between neighbouring keys; slerp for rotations.
    Linear,
}

/// Keyframe values of a channel, one entry per keyframe time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelValues {
    Translations(Vec<Vec3>),
    Rotations(Vec<Quat>),
}

impl ChannelValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Translations(v) => v.len(),
            Self::Rotations(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sampled {
    Translation(Vec3),
    Rotation(Quat),
}

/// One keyframe track targeting a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    target: NodeId,
    times: Vec<f32>,
    values: ChannelValues,
    interpolation: Interpolation,
}

impl Channel {
    /// Builds a channel after validating the track: at least one key, one
    /// value per key, strictly increasing times. Rotation keys are normalized
    /// on the way in.
    pub fn new(
        target: NodeId,
        times: Vec<f32>,
        values: ChannelValues,
        interpolation: Interpolation,
    ) -> Result<Self, SceneError> {
        if times.is_empty() {
            return Err(SceneError::BadChannel("channel has no keyframes"));
        }
        if times.len() != values.len() {
            return Err(SceneError::BadChannel("times and values lengths differ"));
        }
        if times.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SceneError::BadChannel("times must be strictly increasing"));
        }
        let values = match values {
            ChannelValues::Rotations(rotations) => {
                ChannelValues::Rotations(rotations.into_iter().map(Quat::normalize).collect())
            }
            translations => translations,
        };
        Ok(Self {
            target,
            times,
            values,
            interpolation,
        })
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    fn value_at(&self, index: usize) -> Sampled {
        match &self.values {
            ChannelValues::Translations(v) => Sampled::Translation(v[index]),
            ChannelValues::Rotations(v) => Sampled::Rotation(v[index]),
        }
    }

    fn sample(&self, t: f32) -> Sampled {
        let times = &self.times;
        if t <= times[0] {
            return self.value_at(0);
        }
        let last = times.len() - 1;
        if t >= times[last] {
            return self.value_at(last);
        }
        // first key strictly after t; t is inside the track, so 1..=last
        let right = times.partition_point(|&key| key <= t);
        let left = right - 1;
        match self.interpolation {
            Interpolation::Step => self.value_at(left),
            Interpolation::Linear => {
                let blend = (t - times[left]) / (times[right] - times[left]);
                match &self.values {
                    ChannelValues::Translations(v) => {
                        Sampled::Translation(v[left].lerp(v[right], blend))
                    }
                    ChannelValues::Rotations(v) => Sampled::Rotation(v[left].slerp(v[right], blend)),
                }
            }
        }
    }
}

/// A bundle of channels applied together at one sample time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    channels: Vec<Channel>,
}

impl Animation {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Straight-line move of one node from `from` to `to` over `duration`
    /// seconds, clamped at both ends.
    pub fn linear_move(
        target: NodeId,
        from: Vec3,
        to: Vec3,
        duration: f32,
    ) -> Result<Self, SceneError> {
        let channel = Channel::new(
            target,
            vec![0.0, duration],
            ChannelValues::Translations(vec![from, to]),
            Interpolation::Linear,
        )?;
        Ok(Self::new(vec![channel]))
    }

    /// Sample every channel at `t` seconds and write the results into the
    /// targeted node transforms.
    pub fn apply(&self, scene: &mut Scene, t: f32) {
        for channel in &self.channels {
            let Some(node) = scene.node_mut(channel.target) else {
                continue;
            };
            let Some(transform) = node.transform_mut() else {
                continue;
            };
            match channel.sample(t) {
                Sampled::Translation(translation) => transform.translation = translation,
                Sampled::Rotation(rotation) => transform.set_rotation(rotation),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Transform};

    fn translation_channel(target: NodeId, interpolation: Interpolation) -> Channel {
        Channel::new(
            target,
            vec![0.0, 1.0, 3.0],
            ChannelValues::Translations(vec![
                Vec3::ZERO,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 4.0, 0.0),
            ]),
            interpolation,
        )
        .unwrap()
    }

    fn sampled_translation(channel: &Channel, t: f32) -> Vec3 {
        match channel.sample(t) {
            Sampled::Translation(v) => v,
            Sampled::Rotation(_) => panic!("expected a translation sample"),
        }
    }

    #[test]
    fn sampling_clamps_to_track_ends() {
        let channel = translation_channel(NodeId(1), Interpolation::Linear);
        assert_eq!(sampled_translation(&channel, -5.0), Vec3::ZERO);
        assert_eq!(
            sampled_translation(&channel, 99.0),
            Vec3::new(2.0, 4.0, 0.0)
        );
    }

    #[test]
    fn linear_sampling_blends_between_keys() {
        let channel = translation_channel(NodeId(1), Interpolation::Linear);
        let mid = sampled_translation(&channel, 0.5);
        assert!((mid - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        // halfway through the second span, which runs from t=1 to t=3
        let later = sampled_translation(&channel, 2.0);
        assert!((later - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn step_sampling_holds_the_left_key() {
        let channel = translation_channel(NodeId(1), Interpolation::Step);
        assert_eq!(sampled_translation(&channel, 0.99), Vec3::ZERO);
        assert_eq!(
            sampled_translation(&channel, 1.01),
            Vec3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn rotations_slerp_along_the_shortest_arc() {
        let channel = Channel::new(
            NodeId(1),
            vec![0.0, 1.0],
            ChannelValues::Rotations(vec![
                Quat::IDENTITY,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ]),
            Interpolation::Linear,
        )
        .unwrap();
        let Sampled::Rotation(rotation) = channel.sample(0.5) else {
            panic!("expected a rotation sample");
        };
        let out = rotation * Vec3::X;
        let quarter = 2f32.sqrt() / 2.0;
        assert!((out - Vec3::new(quarter, 0.0, -quarter)).length() < 1e-5);
    }

    #[test]
    fn rotation_keys_are_normalized_on_construction() {
        let channel = Channel::new(
            NodeId(1),
            vec![0.0],
            ChannelValues::Rotations(vec![Quat::from_xyzw(0.0, 0.0, 0.0, 2.0)]),
            Interpolation::Linear,
        )
        .unwrap();
        let Sampled::Rotation(rotation) = channel.sample(0.0) else {
            panic!("expected a rotation sample");
        };
        assert!((rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn malformed_tracks_are_rejected() {
        let empty = Channel::new(
            NodeId(1),
            vec![],
            ChannelValues::Translations(vec![]),
            Interpolation::Linear,
        );
        assert!(matches!(empty, Err(SceneError::BadChannel(_))));

        let mismatched = Channel::new(
            NodeId(1),
            vec![0.0, 1.0],
            ChannelValues::Translations(vec![Vec3::ZERO]),
            Interpolation::Linear,
        );
        assert!(matches!(mismatched, Err(SceneError::BadChannel(_))));

        let unsorted = Channel::new(
            NodeId(1),
            vec![0.0, 0.0],
            ChannelValues::Translations(vec![Vec3::ZERO, Vec3::ONE]),
            Interpolation::Linear,
        );
        assert!(matches!(unsorted, Err(SceneError::BadChannel(_))));
    }

    #[test]
    fn linear_move_with_zero_duration_is_rejected() {
        assert!(Animation::linear_move(NodeId(1), Vec3::ZERO, Vec3::ONE, 0.0).is_err());
    }

    #[test]
    fn apply_writes_into_the_target_transform() {
        let mut scene = Scene::new();
        let root = scene.root();
        let cube = scene.spawn_with([Component::Transform(Transform::default())]);
        scene.attach(root, cube).unwrap();

        let animation =
            Animation::linear_move(cube, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 2.0).unwrap();
        animation.apply(&mut scene, 1.0);

        let translation = scene.node(cube).unwrap().transform().unwrap().translation;
        assert!((translation - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn apply_skips_missing_targets_and_bare_nodes() {
        let mut scene = Scene::new();
        let bare = scene.spawn();
        let animation =
            Animation::linear_move(NodeId(77), Vec3::ZERO, Vec3::ONE, 1.0).unwrap();
        // target does not exist; nothing to assert beyond "does not panic"
        animation.apply(&mut scene, 0.5);

        let on_bare = Animation::linear_move(bare, Vec3::ZERO, Vec3::ONE, 1.0).unwrap();
        on_bare.apply(&mut scene, 0.5);
        assert!(scene.node(bare).unwrap().transform().is_none());
    }
}
