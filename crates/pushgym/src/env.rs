//! The push-task environment: episode orchestration, termination, reward.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;

use pushgym_math::{goal_distance, BoundedSpace, Point3};
use pushgym_scene::{ArmRobot, Robot, TableWorld, World};
use pushgym_sim::{SessionMode, SimSession};

use crate::action::{integrate_ik_action, ik_command, joint_command, HandPose};
use crate::config::PushEnvConfig;
use crate::error::{EnvError, Result};
use crate::observation::build_observation;
use crate::reward::TARGET_DIST_MIN;
use crate::target::sample_target_pose;

/// Idle physics steps run after each collaborator reset so nothing spawns
/// inside colliding geometry.
const SETTLE_STEPS: u32 = 100;
const SOLVER_ITERATIONS: usize = 150;
const GRAVITY_Z: f64 = -9.8;
const MARKER_LENGTH: f64 = 0.1;

/// Reference distances below this are treated as zero.
const DIST_EPS: f64 = 1e-12;

/// Rendered frame width for `rgb_array` mode.
pub const RENDER_WIDTH: usize = 960;
/// Rendered frame height for `rgb_array` mode.
pub const RENDER_HEIGHT: usize = 720;

/// Result of one environment step.
#[derive(Debug, Clone)]
pub struct Step {
    /// The scaled observation after the action.
    pub observation: Vec<f64>,
    /// Shaped reward for the transition.
    pub reward: f64,
    /// Whether the episode is over (success or step budget exhausted).
    pub done: bool,
    /// Auxiliary diagnostics; currently always empty.
    pub info: HashMap<String, String>,
}

/// Per-episode state, created at `reset()` and replaced by the next one.
struct EpisodeState {
    step_counter: u32,
    terminated: bool,
    target_pose: Point3,
    hand_pose: HandPose,
    init_hand_obj_dist: f64,
    max_obj_target_dist: f64,
}

/// The push-task environment.
///
/// Generic over the [`Robot`] and [`World`] collaborator interfaces;
/// [`PushEnv::new`] wires in the Rapier-backed implementations.
pub struct PushEnv<R: Robot, W: World> {
    config: PushEnvConfig,
    sim: SimSession,
    robot: R,
    world: W,
    observation_space: BoundedSpace,
    action_space: BoundedSpace,
    target_noise: Option<Normal<f64>>,
    rng: StdRng,
    episode: Option<EpisodeState>,
}

impl PushEnv<ArmRobot, TableWorld> {
    /// Build the environment with the Rapier-backed arm and table world.
    pub fn new(config: PushEnvConfig) -> Result<Self> {
        config.validate()?;
        let mode = if config.render {
            SessionMode::Viewer
        } else {
            SessionMode::Headless
        };
        let sim = SimSession::connect(mode)?;
        let robot = ArmRobot::new(
            config.control_arm,
            config.use_inverse_kinematics,
            config.control_orientation,
        );
        let world = TableWorld::new(
            &config.object_name,
            config.object_pose_noise_std,
            robot.workspace(),
        )?;
        Self::with_collaborators(config, sim, robot, world)
    }
}

impl<R: Robot, W: World> PushEnv<R, W> {
    /// Build the environment around explicit collaborators.
    ///
    /// The scene is built once during construction to size the observation
    /// space, so a failed first reset surfaces here.
    pub fn with_collaborators(
        config: PushEnvConfig,
        sim: SimSession,
        mut robot: R,
        world: W,
    ) -> Result<Self> {
        config.validate()?;

        // Narrow the workspace floor to the table plane, once.
        let mut workspace = robot.workspace();
        workspace.low[2] = world.table_height();
        robot.set_workspace(workspace);

        let target_noise = if config.target_pose_noise_std > 0.0 {
            Some(
                Normal::new(0.0, config.target_pose_noise_std).map_err(|_| {
                    EnvError::Config(format!(
                        "unusable target_pose_noise_std: {}",
                        config.target_pose_noise_std
                    ))
                })?,
            )
        } else {
            None
        };
        let action_space = BoundedSpace::symmetric(robot.action_dim(), 1.0);

        let mut env = Self {
            config,
            sim,
            robot,
            world,
            observation_space: BoundedSpace::from_bounds(Vec::new()),
            action_space,
            target_noise,
            rng: StdRng::seed_from_u64(0),
            episode: None,
        };
        env.reset()?;
        Ok(env)
    }

    /// Start a fresh episode and return the scaled initial observation.
    pub fn reset(&mut self) -> Result<Vec<f64>> {
        tracing::debug!("resetting episode");
        self.episode = None;

        self.sim.reset_scene();
        self.sim.set_gravity(0.0, 0.0, GRAVITY_Z);
        self.sim.set_solver_iterations(SOLVER_ITERATIONS);

        self.robot.reset(&mut self.sim)?;
        for _ in 0..SETTLE_STEPS {
            self.sim.step();
        }
        self.world.reset(&mut self.sim)?;
        for _ in 0..SETTLE_STEPS {
            self.sim.step();
        }

        let (world_obs, _) = self.world.observation(&self.sim)?;
        let object_pos = Point3::new(world_obs[0], world_obs[1], world_obs[2]);
        let target_pose = sample_target_pose(
            &object_pos,
            self.target_noise.as_ref(),
            &self.world.workspace(),
            &mut self.rng,
        );
        self.sim.add_axis_marker(&target_pose, MARKER_LENGTH);

        let (robot_obs, _) = self.robot.observation(&self.sim)?;
        let hand_pos = Point3::new(robot_obs[0], robot_obs[1], robot_obs[2]);
        let init_hand_obj_dist = goal_distance(&hand_pos, &object_pos);
        let max_obj_target_dist = goal_distance(&object_pos, &target_pose);
        if init_hand_obj_dist <= DIST_EPS {
            return Err(EnvError::DegenerateEpisode(
                "hand reset onto the object; reach normalizer would be zero",
            ));
        }
        if max_obj_target_dist <= DIST_EPS {
            return Err(EnvError::DegenerateEpisode(
                "target sampled onto the object; push normalizer would be zero",
            ));
        }

        self.episode = Some(EpisodeState {
            step_counter: 0,
            terminated: false,
            target_pose,
            hand_pose: HandPose::from_home(self.robot.home_hand_pose()),
            init_hand_obj_dist,
            max_obj_target_dist,
        });
        self.scaled_observation()
    }

    /// Apply one normalized agent action and advance the episode.
    pub fn step(&mut self, action: &[f64]) -> Result<Step> {
        self.episode()?;
        self.apply_action(action)?;

        let observation = self.scaled_observation()?;
        let done = self.check_termination()?;
        let reward = self.compute_reward()?;

        Ok(Step {
            observation,
            reward,
            done,
            info: HashMap::new(),
        })
    }

    /// Seed the environment and both collaborators.
    ///
    /// With `None` a fresh seed is drawn and returned, so recorded seeds
    /// always reproduce the episode stream.
    pub fn seed(&mut self, seed: Option<u64>) -> [u64; 1] {
        let seed = seed.unwrap_or_else(rand::random);
        self.rng = StdRng::seed_from_u64(seed);
        self.robot.seed(seed);
        self.world.seed(seed);
        [seed]
    }

    /// Render the scene.
    ///
    /// `"rgb_array"` yields a `RENDER_WIDTH x RENDER_HEIGHT x 3` RGB
    /// buffer; any other mode yields an empty vector.
    pub fn render(&self, mode: &str) -> Vec<u8> {
        if mode == "rgb_array" {
            self.sim.render_frame(RENDER_WIDTH, RENDER_HEIGHT)
        } else {
            Vec::new()
        }
    }

    /// The declared observation space bounds.
    pub fn observation_space(&self) -> &BoundedSpace {
        &self.observation_space
    }

    /// The declared action space bounds.
    pub fn action_space(&self) -> &BoundedSpace {
        &self.action_space
    }

    /// The active configuration.
    pub fn config(&self) -> &PushEnvConfig {
        &self.config
    }

    /// Completed physics repeats in the current episode.
    pub fn episode_steps(&self) -> Option<u32> {
        self.episode.as_ref().map(|e| e.step_counter)
    }

    /// The current episode's target pose.
    pub fn target_pose(&self) -> Option<Point3> {
        self.episode.as_ref().map(|e| e.target_pose)
    }

    fn episode(&self) -> Result<&EpisodeState> {
        self.episode
            .as_ref()
            .ok_or_else(|| EnvError::Config("reset() must be called before step()".into()))
    }

    fn episode_mut(&mut self) -> Result<&mut EpisodeState> {
        self.episode
            .as_mut()
            .ok_or_else(|| EnvError::Config("reset() must be called before step()".into()))
    }

    fn apply_action(&mut self, action: &[f64]) -> Result<()> {
        if self.sim.mode() == SessionMode::Viewer {
            self.sim.pace_real_time(self.config.action_repeat);
        }
        let workspace = self.robot.workspace();
        let rotation_limits = self.robot.rotation_limits();

        for _ in 0..self.config.action_repeat {
            // Rescaling through the declared action bounds is part of the
            // contract even while they are symmetric.
            let physical = self.action_space.scale_from_normalized(action)?;

            if self.config.use_inverse_kinematics {
                let hand = integrate_ik_action(
                    self.episode()?.hand_pose,
                    &physical,
                    self.config.control_orientation,
                    &workspace,
                    &rotation_limits,
                );
                self.episode_mut()?.hand_pose = hand;
                let command = ik_command(&hand, self.config.control_orientation);
                self.robot.apply_action(&mut self.sim, &command)?;
            } else {
                let (robot_obs, _) = self.robot.observation(&self.sim)?;
                let joint_count = self.robot.controlled_joints().len();
                let joints = &robot_obs[robot_obs.len() - joint_count..];
                let command = joint_command(joints, &physical);
                self.robot.apply_action(&mut self.sim, &command)?;
            }

            self.sim.step();

            let terminated = self.check_termination()?;
            self.episode_mut()?.step_counter += 1;
            if terminated {
                break;
            }
        }
        Ok(())
    }

    /// Success is reaching the target; the flag is sticky until the next
    /// reset. Exceeding the step budget also ends the episode.
    fn check_termination(&mut self) -> Result<bool> {
        let (world_obs, _) = self.world.observation(&self.sim)?;
        let object_pos = Point3::new(world_obs[0], world_obs[1], world_obs[2]);
        let max_steps = self.config.max_steps;

        let episode = self.episode_mut()?;
        let d = goal_distance(&object_pos, &episode.target_pose);

        if d <= TARGET_DIST_MIN {
            if !episode.terminated {
                tracing::info!(
                    distance = d,
                    steps = episode.step_counter,
                    "push succeeded"
                );
            }
            episode.terminated = true;
            return Ok(true);
        }
        if episode.terminated {
            return Ok(true);
        }
        if episode.step_counter > max_steps {
            tracing::debug!(steps = episode.step_counter, "episode timed out");
            return Ok(true);
        }
        Ok(false)
    }

    fn compute_reward(&self) -> Result<f64> {
        let (robot_obs, _) = self.robot.observation(&self.sim)?;
        let (world_obs, _) = self.world.observation(&self.sim)?;
        let episode = self.episode()?;

        let hand = Point3::new(robot_obs[0], robot_obs[1], robot_obs[2]);
        let object = Point3::new(world_obs[0], world_obs[1], world_obs[2]);
        let d1 = goal_distance(&hand, &object);
        let d2 = goal_distance(&object, &episode.target_pose);

        Ok(self.config.reward_policy.compute(
            d1,
            d2,
            episode.init_hand_obj_dist,
            episode.max_obj_target_dist,
        ))
    }

    fn scaled_observation(&mut self) -> Result<Vec<f64>> {
        let episode = self.episode()?;
        let (robot_obs, robot_bounds) = self.robot.observation(&self.sim)?;
        let (world_obs, world_bounds) = self.world.observation(&self.sim)?;
        let (observation, bounds) = build_observation(
            &robot_obs,
            &robot_bounds,
            &world_obs,
            &world_bounds,
            &episode.target_pose,
        );

        // The bounds are fixed by the configuration; size the declared
        // space on first use and normalize against it from then on.
        if self.observation_space.is_empty() {
            self.observation_space = BoundedSpace::from_bounds(bounds);
        }
        Ok(self.observation_space.scale_to_normalized(&observation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use pushgym_math::BoxLimits;
    use pushgym_scene::{BoundedObservation, SceneError};
    use pushgym_sim::SessionMode;

    fn headless() -> SimSession {
        SimSession::connect(SessionMode::Headless).unwrap()
    }

    fn quiet_config() -> PushEnvConfig {
        PushEnvConfig {
            target_pose_noise_std: 0.0,
            ..Default::default()
        }
    }

    // ---- test doubles ------------------------------------------------- //

    fn pose_bounds() -> Vec<[f64; 2]> {
        let two_pi = 2.0 * std::f64::consts::PI;
        let mut b = vec![[-2.0, 2.0]; 3];
        b.extend([[-two_pi, two_pi]; 3]);
        b
    }

    struct StaticRobot {
        hand: [f64; 3],
        workspace: BoxLimits,
    }

    impl StaticRobot {
        fn at(hand: [f64; 3]) -> Self {
            Self {
                hand,
                workspace: BoxLimits::new([-2.0; 3], [2.0; 3]),
            }
        }
    }

    impl Robot for StaticRobot {
        fn reset(&mut self, _sim: &mut SimSession) -> std::result::Result<(), SceneError> {
            Ok(())
        }
        fn observation(
            &self,
            _sim: &SimSession,
        ) -> std::result::Result<BoundedObservation, SceneError> {
            let mut obs = self.hand.to_vec();
            obs.extend([0.0; 3]);
            Ok((obs, pose_bounds()))
        }
        fn apply_action(
            &mut self,
            _sim: &mut SimSession,
            _target: &[f64],
        ) -> std::result::Result<(), SceneError> {
            Ok(())
        }
        fn workspace(&self) -> BoxLimits {
            self.workspace
        }
        fn set_workspace(&mut self, workspace: BoxLimits) {
            self.workspace = workspace;
        }
        fn rotation_limits(&self) -> BoxLimits {
            BoxLimits::new([-2.0; 3], [2.0; 3])
        }
        fn action_dim(&self) -> usize {
            3
        }
        fn home_hand_pose(&self) -> [f64; 6] {
            [self.hand[0], self.hand[1], self.hand[2], 0.0, 0.0, 0.0]
        }
        fn controlled_joints(&self) -> &[usize] {
            &[]
        }
        fn seed(&mut self, _seed: u64) {}
    }

    struct MovableWorld {
        object: Rc<RefCell<Point3>>,
    }

    impl World for MovableWorld {
        fn reset(&mut self, _sim: &mut SimSession) -> std::result::Result<(), SceneError> {
            Ok(())
        }
        fn observation(
            &self,
            _sim: &SimSession,
        ) -> std::result::Result<BoundedObservation, SceneError> {
            let p = *self.object.borrow();
            Ok((vec![p.x, p.y, p.z, 0.0, 0.0, 0.0], pose_bounds()))
        }
        fn workspace(&self) -> BoxLimits {
            BoxLimits::new([-2.0; 3], [2.0; 3])
        }
        fn table_height(&self) -> f64 {
            -2.0
        }
        fn seed(&mut self, _seed: u64) {}
    }

    fn double_env(
        hand: [f64; 3],
        object: Point3,
        config: PushEnvConfig,
    ) -> (PushEnv<StaticRobot, MovableWorld>, Rc<RefCell<Point3>>) {
        let cell = Rc::new(RefCell::new(object));
        let world = MovableWorld {
            object: cell.clone(),
        };
        let env =
            PushEnv::with_collaborators(config, headless(), StaticRobot::at(hand), world).unwrap();
        (env, cell)
    }

    // ---- tests with the real collaborators ---------------------------- //

    #[test]
    fn test_reset_observation_matches_space() {
        let mut env = PushEnv::new(quiet_config()).unwrap();
        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), env.observation_space().len());
        // hand pose 6 + object pose 6 + in-hand pose 6 + target 3
        assert_eq!(obs.len(), 21);
        assert_eq!(env.action_space().len(), 3);
    }

    #[test]
    fn test_observation_space_stable_across_resets() {
        let mut env = PushEnv::new(quiet_config()).unwrap();
        let space = env.observation_space().clone();
        env.reset().unwrap();
        env.reset().unwrap();
        assert_eq!(env.observation_space(), &space);
    }

    #[test]
    fn test_step_advances_counter_per_repeat() {
        let config = PushEnvConfig {
            action_repeat: 3,
            ..quiet_config()
        };
        let mut env = PushEnv::new(config).unwrap();
        env.reset().unwrap();

        let step = env.step(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(env.episode_steps(), Some(3));
        assert!(!step.done);
        assert!(step.reward.is_finite());
        assert!(step.info.is_empty());
    }

    #[test]
    fn test_hand_integrates_by_position_gain() {
        let mut env = PushEnv::new(quiet_config()).unwrap();
        env.reset().unwrap();
        let before = env.episode.as_ref().unwrap().hand_pose.position[0];

        env.step(&[1.0, 0.0, 0.0]).unwrap();
        let after = env.episode.as_ref().unwrap().hand_pose.position[0];
        assert!((after - before - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_action_dimension_mismatch_is_rejected() {
        let mut env = PushEnv::new(quiet_config()).unwrap();
        env.reset().unwrap();
        assert!(matches!(
            env.step(&[0.0, 0.0]),
            Err(EnvError::Space(_))
        ));
    }

    #[test]
    fn test_joint_control_action_dim() {
        let config = PushEnvConfig {
            use_inverse_kinematics: false,
            ..quiet_config()
        };
        let mut env = PushEnv::new(config).unwrap();
        let obs = env.reset().unwrap();
        assert_eq!(env.action_space().len(), 4);
        assert_eq!(obs.len(), env.observation_space().len());
        let step = env.step(&[0.5, -0.5, 0.0, 0.2]).unwrap();
        assert!(!step.done);
    }

    #[test]
    fn test_seed_round_trip() {
        let mut env = PushEnv::new(quiet_config()).unwrap();
        assert_eq!(env.seed(Some(42)), [42]);
        let drawn = env.seed(None)[0];
        // A drawn seed must itself reproduce.
        assert_eq!(env.seed(Some(drawn)), [drawn]);
    }

    #[test]
    fn test_render_modes() {
        let env = PushEnv::new(quiet_config()).unwrap();
        let frame = env.render("rgb_array");
        assert_eq!(frame.len(), RENDER_WIDTH * RENDER_HEIGHT * 3);
        assert!(env.render("human").is_empty());
    }

    // ---- tests with doubles ------------------------------------------- //

    #[test]
    fn test_termination_boundary_is_inclusive() {
        let (mut env, object) =
            double_env([0.0; 3], Point3::new(0.5, 0.0, 0.0), quiet_config());
        env.reset().unwrap();
        let target = env.target_pose().unwrap();

        // Exactly at the threshold: success.
        *object.borrow_mut() = Point3::new(target.x - TARGET_DIST_MIN, target.y, target.z);
        let step = env.step(&[0.0; 3]).unwrap();
        assert!(step.done);
        assert!(step.reward > 500.0);
    }

    #[test]
    fn test_just_outside_boundary_keeps_running() {
        let (mut env, object) =
            double_env([0.0; 3], Point3::new(0.5, 0.0, 0.0), quiet_config());
        env.reset().unwrap();
        let target = env.target_pose().unwrap();

        *object.borrow_mut() = Point3::new(target.x - 0.0301, target.y, target.z);
        let step = env.step(&[0.0; 3]).unwrap();
        assert!(!step.done);
        assert!(step.reward < 500.0);
    }

    #[test]
    fn test_termination_is_sticky() {
        let (mut env, object) =
            double_env([0.0; 3], Point3::new(0.5, 0.0, 0.0), quiet_config());
        env.reset().unwrap();
        let target = env.target_pose().unwrap();

        *object.borrow_mut() = target;
        assert!(env.step(&[0.0; 3]).unwrap().done);

        // Even after the object moves away, the episode stays terminated
        // until the next reset.
        *object.borrow_mut() = Point3::new(-1.0, -1.0, 0.0);
        assert!(env.step(&[0.0; 3]).unwrap().done);

        env.reset().unwrap();
        assert!(!env.step(&[0.0; 3]).unwrap().done);
    }

    #[test]
    fn test_terminating_repeat_still_counts() {
        let config = PushEnvConfig {
            action_repeat: 5,
            ..quiet_config()
        };
        let (mut env, object) = double_env([0.0; 3], Point3::new(0.5, 0.0, 0.0), config);
        env.reset().unwrap();
        let target = env.target_pose().unwrap();

        // Terminates on the very first repeat; that repeat is counted and
        // the remaining four are skipped.
        *object.borrow_mut() = target;
        env.step(&[0.0; 3]).unwrap();
        assert_eq!(env.episode_steps(), Some(1));
    }

    #[test]
    fn test_step_budget_ends_episode() {
        let config = PushEnvConfig {
            max_steps: 2,
            ..quiet_config()
        };
        let (mut env, _object) =
            double_env([0.0; 3], Point3::new(0.5, 0.0, 0.0), config);
        env.reset().unwrap();

        assert!(!env.step(&[0.0; 3]).unwrap().done); // counter 1
        assert!(!env.step(&[0.0; 3]).unwrap().done); // counter 2
        assert!(env.step(&[0.0; 3]).unwrap().done); // counter 3 > max_steps
    }

    #[test]
    fn test_degenerate_reset_is_fatal() {
        // Hand and object at the same position: the reach normalizer
        // would be zero, which is a precondition violation.
        let cell = Rc::new(RefCell::new(Point3::new(0.1, 0.1, 0.1)));
        let world = MovableWorld {
            object: cell.clone(),
        };
        let result = PushEnv::with_collaborators(
            quiet_config(),
            headless(),
            StaticRobot::at([0.1, 0.1, 0.1]),
            world,
        );
        assert!(matches!(result, Err(EnvError::DegenerateEpisode(_))));
    }

    #[test]
    fn test_target_sampled_from_object_position() {
        let (mut env, _object) =
            double_env([0.0; 3], Point3::new(0.5, 0.1, 0.0), quiet_config());
        env.reset().unwrap();
        let target = env.target_pose().unwrap();
        assert!((target.x - 0.55).abs() < 1e-12);
        assert!((target.y - 0.15).abs() < 1e-12);
        assert!(target.z.abs() < 1e-12);
    }
}
