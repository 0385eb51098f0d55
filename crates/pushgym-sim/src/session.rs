//! Simulation session management using Rapier3d.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use rapier3d::dynamics::{
    CCDSolver, GenericJointBuilder, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters,
    IslandManager, JointAxesMask, JointAxis, MotorModel, MultibodyJointSet, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet, RigidBodyType,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderBuilder, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};

use pushgym_math::Point3;

use crate::error::SimError;
use crate::transform::pose_to_isometry;

/// Default fixed simulation time step in seconds.
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 240.0;

/// Default motor parameters for position-controlled joints.
pub const DEFAULT_MOTOR_STIFFNESS: f32 = 1000.0;
/// Default motor damping for position-controlled joints.
pub const DEFAULT_MOTOR_DAMPING: f32 = 100.0;
/// Default motor force cap.
pub const DEFAULT_MAX_FORCE: f32 = 1000.0;

/// How the session was connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Training mode: no pacing, no viewer.
    Headless,
    /// Human-watchable mode: stepping is paced against the wall clock.
    Viewer,
}

/// Dynamics role of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Static scenery (table, arm base).
    Fixed,
    /// Simulated free body (the pushed object).
    Dynamic,
    /// Position-driven body (the commanded hand).
    Kinematic,
}

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    /// Axis-aligned box given by half extents.
    Cuboid {
        /// Half extents along each axis, in meters.
        half_extents: [f64; 3],
    },
    /// Sphere.
    Ball {
        /// Radius in meters.
        radius: f64,
    },
    /// Cylinder along the local Y axis.
    Cylinder {
        /// Half height in meters.
        half_height: f64,
        /// Radius in meters.
        radius: f64,
    },
}

impl ShapeDesc {
    /// Bounding-sphere radius, used to size rendered sprites.
    fn bounding_radius(&self) -> f64 {
        match self {
            ShapeDesc::Cuboid { half_extents } => {
                (half_extents[0].powi(2) + half_extents[1].powi(2) + half_extents[2].powi(2)).sqrt()
            }
            ShapeDesc::Ball { radius } => *radius,
            ShapeDesc::Cylinder {
                half_height,
                radius,
            } => (half_height.powi(2) + radius.powi(2)).sqrt(),
        }
    }
}

/// An ephemeral debug line segment, cleared on scene reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugMarker {
    /// Segment start point.
    pub from: Point3,
    /// Segment end point.
    pub to: Point3,
    /// RGB color in [0, 1].
    pub color: [f32; 3],
}

pub(crate) struct BodyMeta {
    pub(crate) handle: RigidBodyHandle,
    pub(crate) kind: BodyKind,
    pub(crate) bounding_radius: f64,
}

/// Exclusively-owned handle to one physics simulation.
///
/// One environment owns exactly one session; collaborators receive it by
/// mutable reference and never duplicate it.
pub struct SimSession {
    // Rapier components
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    // Name -> Rapier mapping
    pub(crate) named_bodies: HashMap<String, BodyMeta>,
    named_joints: HashMap<String, ImpulseJointHandle>,

    time_step: f64,
    mode: SessionMode,
    markers: Vec<DebugMarker>,
    last_frame_time: Option<Instant>,
}

impl SimSession {
    /// Connect a new simulation session with the default time step.
    pub fn connect(mode: SessionMode) -> Result<Self, SimError> {
        Self::connect_with_time_step(mode, DEFAULT_TIME_STEP)
    }

    /// Connect a new simulation session with an explicit fixed time step.
    pub fn connect_with_time_step(mode: SessionMode, time_step: f64) -> Result<Self, SimError> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(SimError::Connection(format!(
                "invalid time step: {time_step}"
            )));
        }

        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = time_step as f32;

        Ok(Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector3::new(0.0, 0.0, -9.8),
            integration_params,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            named_bodies: HashMap::new(),
            named_joints: HashMap::new(),
            time_step,
            mode,
            markers: Vec::new(),
            last_frame_time: None,
        })
    }

    /// The fixed simulation time step in seconds.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// The connection mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, x: f64, y: f64, z: f64) {
        self.gravity = Vector3::new(x as f32, y as f32, z as f32);
    }

    /// Set the number of solver iterations per step.
    pub fn set_solver_iterations(&mut self, iterations: usize) {
        if let Some(n) = NonZeroUsize::new(iterations) {
            self.integration_params.num_solver_iterations = n;
        }
    }

    /// Remove every body, collider, joint and marker from the scene.
    ///
    /// Gravity, solver parameters and the time step are kept.
    pub fn reset_scene(&mut self) {
        self.islands = IslandManager::new();
        self.broad_phase = BroadPhaseMultiSap::new();
        self.narrow_phase = NarrowPhase::new();
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.query_pipeline = QueryPipeline::new();
        self.named_bodies.clear();
        self.named_joints.clear();
        self.markers.clear();
    }

    /// Advance the simulation by one fixed time step.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Sleep so that `substeps` simulation steps keep pace with wall-clock
    /// time. Only meaningful in [`SessionMode::Viewer`].
    pub fn pace_real_time(&mut self, substeps: u32) {
        let now = Instant::now();
        if let Some(last) = self.last_frame_time {
            let budget = self.time_step * f64::from(substeps);
            let spent = now.duration_since(last).as_secs_f64();
            if spent < budget {
                std::thread::sleep(Duration::from_secs_f64(budget - spent));
            }
        }
        self.last_frame_time = Some(Instant::now());
    }

    /// Insert a named body with a single collider.
    pub fn insert_body(
        &mut self,
        name: &str,
        kind: BodyKind,
        shape: ShapeDesc,
        position: &Point3,
        euler: &[f64; 3],
        mass: f64,
        friction: f64,
    ) -> Result<(), SimError> {
        if self.named_bodies.contains_key(name) {
            return Err(SimError::DuplicateBody(name.to_string()));
        }

        let body_type = match kind {
            BodyKind::Fixed => RigidBodyType::Fixed,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let pose = to_f32_isometry(&pose_to_isometry(position, euler));

        let rigid_body = RigidBodyBuilder::new(body_type)
            .position(pose)
            .additional_mass(mass as f32)
            .build();
        let handle = self.bodies.insert(rigid_body);

        let collider_builder = match shape {
            ShapeDesc::Cuboid { half_extents } => ColliderBuilder::cuboid(
                half_extents[0] as f32,
                half_extents[1] as f32,
                half_extents[2] as f32,
            ),
            ShapeDesc::Ball { radius } => ColliderBuilder::ball(radius as f32),
            ShapeDesc::Cylinder {
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height as f32, radius as f32),
        };
        let collider = collider_builder
            .friction(friction as f32)
            .restitution(0.1)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.named_bodies.insert(
            name.to_string(),
            BodyMeta {
                handle,
                kind,
                bounding_radius: shape.bounding_radius(),
            },
        );
        Ok(())
    }

    /// Query the world pose of a named body.
    pub fn body_pose(&self, name: &str) -> Result<(Point3, UnitQuaternion<f64>), SimError> {
        let meta = self
            .named_bodies
            .get(name)
            .ok_or_else(|| SimError::MissingBody(name.to_string()))?;
        let body = self
            .bodies
            .get(meta.handle)
            .ok_or_else(|| SimError::MissingBody(name.to_string()))?;
        let pos = body.position();

        Ok((
            Point3::new(
                f64::from(pos.translation.x),
                f64::from(pos.translation.y),
                f64::from(pos.translation.z),
            ),
            UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
                f64::from(pos.rotation.w),
                f64::from(pos.rotation.i),
                f64::from(pos.rotation.j),
                f64::from(pos.rotation.k),
            )),
        ))
    }

    /// Command a kinematic body to the given pose for the next step.
    pub fn set_kinematic_target(
        &mut self,
        name: &str,
        position: &Point3,
        euler: &[f64; 3],
    ) -> Result<(), SimError> {
        let meta = self
            .named_bodies
            .get(name)
            .ok_or_else(|| SimError::MissingBody(name.to_string()))?;
        let body = self
            .bodies
            .get_mut(meta.handle)
            .ok_or_else(|| SimError::MissingBody(name.to_string()))?;
        body.set_next_kinematic_position(to_f32_isometry(&pose_to_isometry(position, euler)));
        Ok(())
    }

    /// Insert a named motorized revolute joint between two bodies.
    pub fn insert_revolute_joint(
        &mut self,
        name: &str,
        parent: &str,
        child: &str,
        parent_anchor: [f64; 3],
        child_anchor: [f64; 3],
        axis: [f64; 3],
        limits: Option<(f64, f64)>,
    ) -> Result<(), SimError> {
        let parent_handle = self.body_handle(parent)?;
        let child_handle = self.body_handle(child)?;

        let axis_unit = nalgebra::UnitVector3::new_normalize(Vector3::new(
            axis[0] as f32,
            axis[1] as f32,
            axis[2] as f32,
        ));
        let mut builder = GenericJointBuilder::new(JointAxesMask::LOCKED_REVOLUTE_AXES)
            .local_anchor1(nalgebra::Point3::new(
                parent_anchor[0] as f32,
                parent_anchor[1] as f32,
                parent_anchor[2] as f32,
            ))
            .local_anchor2(nalgebra::Point3::new(
                child_anchor[0] as f32,
                child_anchor[1] as f32,
                child_anchor[2] as f32,
            ))
            .local_axis1(axis_unit)
            .local_axis2(axis_unit);

        if let Some((lower, upper)) = limits {
            builder = builder.limits(JointAxis::AngX, [lower as f32, upper as f32]);
        }

        // Position-controlled motor
        builder = builder
            .motor_model(JointAxis::AngX, MotorModel::AccelerationBased)
            .motor_max_force(JointAxis::AngX, DEFAULT_MAX_FORCE);

        let handle = self
            .impulse_joints
            .insert(parent_handle, child_handle, builder.build(), true);
        self.named_joints.insert(name.to_string(), handle);
        Ok(())
    }

    /// Set the position target of a motorized joint, in radians.
    pub fn set_joint_motor_position(&mut self, name: &str, target: f64) -> Result<(), SimError> {
        let handle = *self
            .named_joints
            .get(name)
            .ok_or_else(|| SimError::MissingJoint(name.to_string()))?;
        let joint = self
            .impulse_joints
            .get_mut(handle, true)
            .ok_or_else(|| SimError::MissingJoint(name.to_string()))?;
        joint.data.set_motor_position(
            JointAxis::AngX,
            target as f32,
            DEFAULT_MOTOR_STIFFNESS,
            DEFAULT_MOTOR_DAMPING,
        );
        Ok(())
    }

    /// Read back the current position target of a motorized joint.
    pub fn joint_motor_target(&self, name: &str) -> Result<f64, SimError> {
        let handle = *self
            .named_joints
            .get(name)
            .ok_or_else(|| SimError::MissingJoint(name.to_string()))?;
        let joint = self
            .impulse_joints
            .get(handle)
            .ok_or_else(|| SimError::MissingJoint(name.to_string()))?;
        let target = joint
            .data
            .motor(JointAxis::AngX)
            .map(|m| m.target_pos)
            .unwrap_or(0.0);
        Ok(f64::from(target))
    }

    /// Draw a small RGB axis triad at `origin`, cleared on the next reset.
    pub fn add_axis_marker(&mut self, origin: &Point3, length: f64) {
        self.markers.push(DebugMarker {
            from: *origin,
            to: Point3::new(origin.x + length, origin.y, origin.z),
            color: [1.0, 0.0, 0.0],
        });
        self.markers.push(DebugMarker {
            from: *origin,
            to: Point3::new(origin.x, origin.y + length, origin.z),
            color: [0.0, 1.0, 0.0],
        });
        self.markers.push(DebugMarker {
            from: *origin,
            to: Point3::new(origin.x, origin.y, origin.z + length),
            color: [0.0, 0.0, 1.0],
        });
    }

    /// Currently drawn debug markers.
    pub fn markers(&self) -> &[DebugMarker] {
        &self.markers
    }

    /// Names of all bodies currently in the scene.
    pub fn body_names(&self) -> Vec<String> {
        self.named_bodies.keys().cloned().collect()
    }

    pub(crate) fn body_bounding_radius(&self, name: &str) -> Option<f64> {
        self.named_bodies.get(name).map(|m| m.bounding_radius)
    }

    pub(crate) fn body_kind(&self, name: &str) -> Option<BodyKind> {
        self.named_bodies.get(name).map(|m| m.kind)
    }

    fn body_handle(&self, name: &str) -> Result<RigidBodyHandle, SimError> {
        self.named_bodies
            .get(name)
            .map(|m| m.handle)
            .ok_or_else(|| SimError::MissingBody(name.to_string()))
    }
}

fn to_f32_isometry(iso: &Isometry3<f64>) -> Isometry3<f32> {
    Isometry3::from_parts(
        nalgebra::Translation3::new(
            iso.translation.x as f32,
            iso.translation.y as f32,
            iso.translation.z as f32,
        ),
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
            iso.rotation.w as f32,
            iso.rotation.i as f32,
            iso.rotation.j as f32,
            iso.rotation.k as f32,
        )),
    )
}
