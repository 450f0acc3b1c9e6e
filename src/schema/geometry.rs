use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or direction in world space. +Y is up, +Z is forward at yaw 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A position plus a yaw-only orientation (radians about +Y).
///
/// Road pieces only turn in the horizontal plane; elevation changes
/// (overpasses, underpasses) are carried by the position alone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        yaw: 0.0,
    };

    pub const fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    pub const fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }

    /// Unit vector the pose is facing.
    pub fn forward(&self) -> Vec3 {
        rotate_yaw(Vec3::FORWARD, self.yaw)
    }

    /// Maps a point from this pose's local frame into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + rotate_yaw(local, self.yaw)
    }

    /// Maps a world-space point into this pose's local frame.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        rotate_yaw(world - self.position, -self.yaw)
    }

    /// Treats `local` as expressed in this pose's frame and returns it in
    /// world space.
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            yaw: self.yaw + local.yaw,
        }
    }

    pub fn inverse(&self) -> Pose {
        Pose {
            position: rotate_yaw(-self.position, -self.yaw),
            yaw: -self.yaw,
        }
    }
}

fn rotate_yaw(v: Vec3, yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}
