//! Table-and-object world collaborator.
//!
//! A fixed table slab plus one dynamic object drawn from a small named
//! catalog. The object spawn pose can be perturbed with seeded Gaussian
//! noise for episode-to-episode variation.

use std::f64::consts::FRAC_PI_2;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use pushgym_math::{BoxLimits, Point3};
use pushgym_sim::{BodyKind, ShapeDesc, SimSession};

use crate::error::SceneError;
use crate::traits::{BoundedObservation, World};

const OBJECT_BODY: &str = "object";
const TABLE_BODY: &str = "table";

/// Height of the table's top surface in meters.
pub const TABLE_HEIGHT: f64 = 0.8;

const TABLE_CENTER: [f64; 3] = [0.3, 0.0, TABLE_HEIGHT / 2.0];
const TABLE_HALF_EXTENTS: [f64; 3] = [0.25, 0.5, TABLE_HEIGHT / 2.0];
const TABLE_FRICTION: f64 = 0.8;

/// Margin kept between a noisy spawn pose and the workspace edge.
const SPAWN_MARGIN: f64 = 0.05;

/// One entry of the object catalog.
#[derive(Debug, Clone, Copy)]
struct ObjectSpec {
    name: &'static str,
    shape: ShapeDesc,
    mass: f64,
    /// Distance from the object center to its lowest point when upright.
    half_height: f64,
    /// Spawn orientation making the object stand upright.
    spawn_euler: [f64; 3],
}

// Cylinders lie along their local Y axis, so upright cans/bottles spawn
// rolled a quarter turn about x.
const CATALOG: [ObjectSpec; 3] = [
    ObjectSpec {
        name: "cube",
        shape: ShapeDesc::Cuboid {
            half_extents: [0.025, 0.025, 0.025],
        },
        mass: 0.1,
        half_height: 0.025,
        spawn_euler: [0.0, 0.0, 0.0],
    },
    ObjectSpec {
        name: "mustard_bottle",
        shape: ShapeDesc::Cylinder {
            half_height: 0.09,
            radius: 0.03,
        },
        mass: 0.6,
        half_height: 0.09,
        spawn_euler: [FRAC_PI_2, 0.0, 0.0],
    },
    ObjectSpec {
        name: "soup_can",
        shape: ShapeDesc::Cylinder {
            half_height: 0.05,
            radius: 0.033,
        },
        mass: 0.35,
        half_height: 0.05,
        spawn_euler: [FRAC_PI_2, 0.0, 0.0],
    },
];

/// Names of the objects available to [`TableWorld::new`].
pub fn object_catalog() -> Vec<&'static str> {
    CATALOG.iter().map(|o| o.name).collect()
}

/// Rapier-backed table world collaborator.
pub struct TableWorld {
    object: ObjectSpec,
    spawn_noise: Option<Normal<f64>>,
    workspace: BoxLimits,
    rng: StdRng,
}

impl TableWorld {
    /// Build a world with the named catalog object.
    ///
    /// `workspace` is the robot workspace the object and targets must stay
    /// inside; `spawn_noise_std` is the Gaussian standard deviation applied
    /// to the object's x/y spawn position (0 disables it).
    pub fn new(
        object_name: &str,
        spawn_noise_std: f64,
        workspace: BoxLimits,
    ) -> Result<Self, SceneError> {
        let object = CATALOG
            .iter()
            .find(|o| o.name == object_name)
            .copied()
            .ok_or_else(|| SceneError::UnknownObject(object_name.to_string()))?;

        let spawn_noise = if spawn_noise_std > 0.0 {
            Some(
                Normal::new(0.0, spawn_noise_std)
                    .map_err(|_| SceneError::InvalidSpawnNoise(spawn_noise_std))?,
            )
        } else if spawn_noise_std < 0.0 || !spawn_noise_std.is_finite() {
            return Err(SceneError::InvalidSpawnNoise(spawn_noise_std));
        } else {
            None
        };

        Ok(Self {
            object,
            spawn_noise,
            workspace,
            rng: StdRng::seed_from_u64(0),
        })
    }

    fn spawn_position(&mut self) -> Point3 {
        let (x_min, x_max) = self.workspace.axis(0);
        let (y_min, y_max) = self.workspace.axis(1);
        let mut x = (x_min + x_max) / 2.0;
        let mut y = (y_min + y_max) / 2.0;

        if let Some(noise) = self.spawn_noise {
            x += noise.sample(&mut self.rng);
            y += noise.sample(&mut self.rng);
            x = x.clamp(x_min + SPAWN_MARGIN, x_max - SPAWN_MARGIN);
            y = y.clamp(y_min + SPAWN_MARGIN, y_max - SPAWN_MARGIN);
        }

        Point3::new(x, y, TABLE_HEIGHT + self.object.half_height + 0.001)
    }
}

impl World for TableWorld {
    fn reset(&mut self, sim: &mut SimSession) -> Result<(), SceneError> {
        sim.insert_body(
            TABLE_BODY,
            BodyKind::Fixed,
            ShapeDesc::Cuboid {
                half_extents: TABLE_HALF_EXTENTS,
            },
            &Point3::new(TABLE_CENTER[0], TABLE_CENTER[1], TABLE_CENTER[2]),
            &[0.0; 3],
            0.0,
            TABLE_FRICTION,
        )?;

        let spawn = self.spawn_position();
        sim.insert_body(
            OBJECT_BODY,
            BodyKind::Dynamic,
            self.object.shape,
            &spawn,
            &self.object.spawn_euler,
            self.object.mass,
            TABLE_FRICTION,
        )?;
        Ok(())
    }

    fn observation(&self, sim: &SimSession) -> Result<BoundedObservation, SceneError> {
        let (pos, orn) = sim.body_pose(OBJECT_BODY)?;
        let euler = pushgym_sim::quat_to_euler(&orn);

        let obs = vec![pos.x, pos.y, pos.z, euler[0], euler[1], euler[2]];
        let mut bounds: Vec<[f64; 2]> = self.workspace.bound_pairs().to_vec();
        let two_pi = 2.0 * std::f64::consts::PI;
        bounds.extend([[-two_pi, two_pi]; 3]);
        Ok((obs, bounds))
    }

    fn workspace(&self) -> BoxLimits {
        self.workspace
    }

    fn table_height(&self) -> f64 {
        TABLE_HEIGHT
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
