//! The zeroth-order search adapter: hands out optimizer candidates as trial
//! configurations and feeds completed results back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use zt_racos::SRacosTune;
use zt_types::{
    BestSolution, Configuration, DimensionSpec, Mode, Optimizer, Solution, TrialError,
    TrialMetrics, TuneResult,
};

use crate::algorithm::SearchAlgorithm;
use crate::config::{Algorithm, FailurePolicy, ResolvedConfig, ZoSearchConfig};
use crate::hook::{NoopHook, ResultHook};

/// A trial that has been handed out and not yet completed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveTrial {
    pub solution: Solution,
    pub configuration: Configuration,
}

/// Search algorithm backed by a black-box optimizer that always minimizes.
///
/// The adapter owns exactly one optimizer at a time. `restore` swaps it for
/// a deserialized instance. Scores are `metric_sign * result[metric]`, so
/// maximization reaches the optimizer negated.
pub struct ZoSearch<O = SRacosTune> {
    id: Uuid,
    algorithm: Algorithm,
    optimizer: O,
    space: DimensionSpec,
    max_concurrent: usize,
    metric: String,
    mode: Mode,
    metric_sign: f64,
    use_early_stopped_trials: bool,
    failure_policy: FailurePolicy,
    live_trials: HashMap<String, LiveTrial>,
    best_solutions: Vec<BestSolution>,
    hook: Box<dyn ResultHook>,
}

impl ZoSearch<SRacosTune> {
    /// Validate `config` and build the racos tuner it names.
    pub fn new(config: ZoSearchConfig) -> TuneResult<Self> {
        let resolved = config.validate()?;
        let optimizer = SRacosTune::new(resolved.dimensions.clone(), resolved.racos_parameter())?;
        Ok(Self::from_parts(resolved, optimizer))
    }
}

impl<O: Optimizer> ZoSearch<O> {
    /// Validate `config` and wrap an already-built optimizer.
    pub fn with_optimizer(config: ZoSearchConfig, optimizer: O) -> TuneResult<Self> {
        let resolved = config.validate()?;
        Ok(Self::from_parts(resolved, optimizer))
    }

    fn from_parts(config: ResolvedConfig, optimizer: O) -> Self {
        let id = Uuid::new_v4();
        info!(
            %id,
            algorithm = %config.algorithm,
            optimizer = optimizer.name(),
            budget = config.budget,
            dimensions = config.dimensions.len(),
            max_concurrent = config.max_concurrent,
            metric = %config.metric,
            mode = %config.mode,
            "Created zeroth-order search"
        );

        Self {
            id,
            algorithm: config.algorithm,
            optimizer,
            space: config.dimensions,
            max_concurrent: config.max_concurrent,
            metric: config.metric,
            mode: config.mode,
            metric_sign: config.mode.sign(),
            use_early_stopped_trials: config.use_early_stopped_trials,
            failure_policy: config.failure_policy,
            live_trials: HashMap::new(),
            best_solutions: Vec::new(),
            hook: Box::new(NoopHook),
        }
    }

    /// Request a configuration for `trial_id`.
    ///
    /// Returns `Ok(None)` without consulting the optimizer when the live
    /// trial count has reached `max_concurrent`, and `Ok(None)` when the
    /// optimizer has nothing to propose.
    pub fn suggest(&mut self, trial_id: &str) -> TuneResult<Option<Configuration>> {
        if self.num_live_trials() >= self.max_concurrent {
            debug!(
                trial_id,
                live = self.num_live_trials(),
                "At concurrency limit, no suggestion"
            );
            return Ok(None);
        }
        if self.live_trials.contains_key(trial_id) {
            return Err(TrialError::AlreadyLive {
                trial_id: trial_id.to_string(),
            }
            .into());
        }

        let Some(solution) = self.optimizer.suggest() else {
            debug!(trial_id, "Optimizer returned no candidate");
            return Ok(None);
        };

        let configuration = Configuration::from_solution(&self.space, &solution.x);
        debug!(trial_id, config = %configuration, "Suggested configuration");
        self.live_trials.insert(
            trial_id.to_string(),
            LiveTrial {
                solution,
                configuration: configuration.clone(),
            },
        );
        Ok(Some(configuration))
    }

    /// Intermediate results are not used by this optimizer family.
    pub fn on_trial_result(&mut self, _trial_id: &str, _result: &TrialMetrics) {}

    /// Final notification for `trial_id`.
    ///
    /// The trial stops being live whatever the outcome. A non-empty result is
    /// reported to the optimizer and post-processed; an absent or empty one
    /// is handled by the configured [`FailurePolicy`].
    pub fn on_trial_complete(
        &mut self,
        trial_id: &str,
        result: Option<&TrialMetrics>,
        error: bool,
        early_terminated: bool,
    ) -> TuneResult<()> {
        let live = self
            .live_trials
            .remove(trial_id)
            .ok_or_else(|| TrialError::UnknownTrial {
                trial_id: trial_id.to_string(),
            })?;

        match result.filter(|r| !r.is_empty()) {
            Some(result) => {
                let Some(&raw) = result.get(&self.metric) else {
                    warn!(trial_id, metric = %self.metric, "Result lacks the metric, abandoning candidate");
                    self.optimizer.abandon(&live.solution);
                    return Err(TrialError::MissingMetric {
                        trial_id: trial_id.to_string(),
                        metric: self.metric.clone(),
                    }
                    .into());
                };
                debug!(trial_id, raw, error, early_terminated, "Trial completed");
                self.report(&live.solution, raw);
                self.process_result(trial_id, result, early_terminated);
            }
            None => self.handle_missing_result(trial_id, &live.solution, error),
        }
        Ok(())
    }

    fn report(&mut self, solution: &Solution, raw: f64) {
        let score = self.metric_sign * raw;
        if let Some(best) = self.optimizer.complete(solution, score) {
            self.best_solutions.push(BestSolution::new(best));
        }
    }

    fn handle_missing_result(&mut self, trial_id: &str, solution: &Solution, error: bool) {
        match self.failure_policy {
            FailurePolicy::Ignore => {
                warn!(trial_id, error, "Trial finished without a result, abandoning candidate");
                self.optimizer.abandon(solution);
            }
            FailurePolicy::Release => {
                warn!(trial_id, error, "Trial finished without a result, releasing candidate");
                self.optimizer.release(solution);
            }
            FailurePolicy::Penalize { value } => {
                warn!(trial_id, error, value, "Trial finished without a result, reporting penalty");
                self.report(solution, value);
            }
        }
    }

    fn process_result(&mut self, trial_id: &str, result: &TrialMetrics, early_terminated: bool) {
        if early_terminated && !self.use_early_stopped_trials {
            debug!(trial_id, "Skipping result of early-terminated trial");
            return;
        }
        self.hook.on_result(trial_id, result);
    }

    pub fn num_live_trials(&self) -> usize {
        self.live_trials.len()
    }

    pub fn live_trial_ids(&self) -> impl Iterator<Item = &str> {
        self.live_trials.keys().map(String::as_str)
    }

    pub fn live_trial(&self, trial_id: &str) -> Option<&LiveTrial> {
        self.live_trials.get(trial_id)
    }

    /// Every best-so-far solution the optimizer reported, oldest first.
    pub fn best_solutions(&self) -> &[BestSolution] {
        &self.best_solutions
    }

    /// The most recent best solution as a configuration.
    pub fn best_configuration(&self) -> Option<Configuration> {
        self.best_solutions
            .last()
            .map(|best| Configuration::from_solution(&self.space, &best.solution.x))
    }

    /// Install a post-processing hook for completed results.
    pub fn set_result_hook(&mut self, hook: impl ResultHook + 'static) {
        self.hook = Box::new(hook);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn metric_sign(&self) -> f64 {
        self.metric_sign
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn is_finished(&self) -> bool {
        self.optimizer.is_exhausted()
    }
}

impl<O: Optimizer + Serialize + DeserializeOwned> ZoSearch<O> {
    /// Write the whole optimizer to `path`.
    ///
    /// The snapshot goes to a temporary file next to `path` and is renamed
    /// into place, so a crash never leaves a truncated checkpoint.
    pub fn save(&self, path: &Path) -> TuneResult<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".to_string());
        let tmp_path = parent.join(format!(".{file_name}.{}.tmp", self.id));

        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, &self.optimizer)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, path)?;

        info!(id = %self.id, path = %path.display(), "Saved optimizer checkpoint");
        Ok(())
    }

    /// Replace the optimizer with the snapshot stored at `path`.
    ///
    /// Live trials and the best-solution log are left as they are. Completing
    /// a live trial the restored optimizer does not hold pending gives it no
    /// score.
    pub fn restore(&mut self, path: &Path) -> TuneResult<()> {
        let reader = BufReader::new(File::open(path)?);
        let optimizer: O = serde_json::from_reader(reader)?;
        self.optimizer = optimizer;

        info!(id = %self.id, path = %path.display(), "Restored optimizer checkpoint");
        Ok(())
    }
}

impl<O: Optimizer + Serialize + DeserializeOwned> SearchAlgorithm for ZoSearch<O> {
    fn suggest(&mut self, trial_id: &str) -> TuneResult<Option<Configuration>> {
        ZoSearch::<O>::suggest(self, trial_id)
    }

    fn on_trial_result(&mut self, trial_id: &str, result: &TrialMetrics) {
        ZoSearch::<O>::on_trial_result(self, trial_id, result)
    }

    fn on_trial_complete(
        &mut self,
        trial_id: &str,
        result: Option<&TrialMetrics>,
        error: bool,
        early_terminated: bool,
    ) -> TuneResult<()> {
        ZoSearch::<O>::on_trial_complete(self, trial_id, result, error, early_terminated)
    }

    fn save(&self, path: &Path) -> TuneResult<()> {
        ZoSearch::<O>::save(self, path)
    }

    fn restore(&mut self, path: &Path) -> TuneResult<()> {
        ZoSearch::<O>::restore(self, path)
    }

    fn is_finished(&self) -> bool {
        ZoSearch::<O>::is_finished(self)
    }

    fn name(&self) -> &str {
        self.algorithm.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};
    use zt_types::{ConfigError, ParameterValue, TuneError};

    /// Optimizer double that hands out fixed points and records scores.
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct RecordingOptimizer {
        next: u64,
        remaining: Option<usize>,
        scores: Vec<f64>,
        released: Vec<u64>,
        abandoned: Vec<u64>,
    }

    impl RecordingOptimizer {
        fn with_budget(n: usize) -> Self {
            Self {
                remaining: Some(n),
                ..Self::default()
            }
        }
    }

    impl Optimizer for RecordingOptimizer {
        fn suggest(&mut self) -> Option<Solution> {
            if let Some(left) = self.remaining.as_mut() {
                if *left == 0 {
                    return None;
                }
                *left -= 1;
            }
            let id = self.next;
            self.next += 1;
            Some(Solution::new(id, vec![id as f64 * 0.5, id as f64]))
        }

        fn complete(&mut self, solution: &Solution, score: f64) -> Option<Solution> {
            self.scores.push(score);
            Some(solution.clone().with_value(score))
        }

        fn release(&mut self, solution: &Solution) {
            self.released.push(solution.id);
        }

        fn abandon(&mut self, solution: &Solution) {
            self.abandoned.push(solution.id);
        }

        fn is_exhausted(&self) -> bool {
            self.remaining == Some(0)
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[derive(Clone, Default)]
    struct CollectingHook(Arc<Mutex<Vec<String>>>);

    impl ResultHook for CollectingHook {
        fn on_result(&mut self, trial_id: &str, _result: &TrialMetrics) {
            self.0.lock().unwrap().push(trial_id.to_string());
        }
    }

    fn space() -> DimensionSpec {
        DimensionSpec::new()
            .add_continuous("lr", 0.0, 100.0, 0.01)
            .add_discrete("layers", 0, 100, true)
    }

    fn config() -> ZoSearchConfig {
        ZoSearchConfig::new(10, space()).with_max_concurrent(3)
    }

    fn metrics(value: f64) -> TrialMetrics {
        TrialMetrics::from([("episode_reward_mean".to_string(), value)])
    }

    fn recording(config: ZoSearchConfig) -> ZoSearch<RecordingOptimizer> {
        ZoSearch::with_optimizer(config, RecordingOptimizer::default()).unwrap()
    }

    #[test]
    fn construction_validates_config() {
        let err = ZoSearch::with_optimizer(
            config().with_algorithm("bayes"),
            RecordingOptimizer::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            TuneError::Config(ConfigError::UnsupportedAlgorithm { .. })
        ));

        let err = ZoSearch::new(config().with_objective("loss", "up")).err().unwrap();
        assert!(matches!(err, TuneError::Config(ConfigError::InvalidMode { .. })));
    }

    #[test]
    fn metric_sign_follows_mode() {
        assert_eq!(recording(config()).metric_sign(), 1.0);
        let max = recording(config().with_objective("episode_reward_mean", "max"));
        assert_eq!(max.metric_sign(), -1.0);
        assert_eq!(max.mode(), Mode::Max);
    }

    #[test]
    fn suggest_zips_names_with_coordinates() {
        let mut search = recording(config());
        search.suggest("t0").unwrap().unwrap();
        let config = search.suggest("t1").unwrap().unwrap();
        assert_eq!(config.get("lr"), Some(&ParameterValue::Float(0.5)));
        assert_eq!(config.get("layers"), Some(&ParameterValue::Int(1)));
        let names: Vec<&str> = config.names().collect();
        assert_eq!(names, vec!["lr", "layers"]);
    }

    #[test]
    fn capacity_limit_refuses_without_consulting_optimizer() {
        let mut search = recording(config());
        for i in 0..3 {
            assert!(search.suggest(&format!("t{i}")).unwrap().is_some());
        }
        assert!(search.suggest("t3").unwrap().is_none());
        assert_eq!(search.optimizer().next, 3);
        assert_eq!(search.num_live_trials(), 3);
    }

    #[test]
    fn duplicate_live_id_is_rejected() {
        let mut search = recording(config());
        search.suggest("t0").unwrap();
        let err = search.suggest("t0").unwrap_err();
        assert!(matches!(err, TuneError::Trial(TrialError::AlreadyLive { .. })));
        assert_eq!(search.num_live_trials(), 1);
    }

    #[test]
    fn optimizer_absence_propagates() {
        let mut search =
            ZoSearch::with_optimizer(config(), RecordingOptimizer::with_budget(1)).unwrap();
        assert!(search.suggest("a").unwrap().is_some());
        assert!(search.suggest("b").unwrap().is_none());
        assert_eq!(search.num_live_trials(), 1);
        assert!(search.is_finished());
    }

    #[test]
    fn returned_configuration_is_a_copy() {
        let mut search = recording(config());
        let mut handed_out = search.suggest("t0").unwrap().unwrap();
        *handed_out.get_mut("lr").unwrap() = ParameterValue::Float(99.0);

        let live = search.live_trial("t0").unwrap();
        assert_eq!(live.configuration.get("lr"), Some(&ParameterValue::Float(0.0)));
    }

    #[test]
    fn completion_reports_signed_score() {
        let mut min = recording(config());
        min.suggest("t0").unwrap();
        min.on_trial_complete("t0", Some(&metrics(3.0)), false, false)
            .unwrap();

        let mut max = recording(config().with_objective("episode_reward_mean", "max"));
        max.suggest("t0").unwrap();
        max.on_trial_complete("t0", Some(&metrics(3.0)), false, false)
            .unwrap();

        assert_eq!(min.optimizer().scores, vec![3.0]);
        assert_eq!(max.optimizer().scores, vec![-3.0]);
    }

    #[test]
    fn completion_removes_trial_and_logs_best() {
        let mut search = recording(config());
        search.suggest("t0").unwrap();
        search.suggest("t1").unwrap();
        let before = search.num_live_trials();

        search
            .on_trial_complete("t1", Some(&metrics(1.5)), false, false)
            .unwrap();

        assert_eq!(search.num_live_trials(), before - 1);
        assert!(search.live_trial("t1").is_none());
        assert_eq!(search.best_solutions().len(), 1);
        assert_eq!(search.best_solutions()[0].solution.value, Some(1.5));
        let best = search.best_configuration().unwrap();
        assert_eq!(best.get("layers"), Some(&ParameterValue::Int(1)));
    }

    #[test]
    fn completing_unknown_trial_fails() {
        let mut search = recording(config());
        let err = search
            .on_trial_complete("ghost", Some(&metrics(1.0)), false, false)
            .unwrap_err();
        assert!(matches!(err, TuneError::Trial(TrialError::UnknownTrial { .. })));

        search.suggest("t0").unwrap();
        search.on_trial_complete("t0", None, true, false).unwrap();
        assert!(search.on_trial_complete("t0", None, true, false).is_err());
    }

    #[test]
    fn missing_metric_is_an_error_and_trial_is_gone() {
        let mut search = recording(config().with_objective("mean_loss", "min"));
        search.suggest("t0").unwrap();
        let err = search
            .on_trial_complete("t0", Some(&metrics(1.0)), false, false)
            .unwrap_err();
        assert!(matches!(err, TuneError::Trial(TrialError::MissingMetric { .. })));
        assert_eq!(search.num_live_trials(), 0);
        assert!(search.optimizer().scores.is_empty());
        assert_eq!(search.optimizer().abandoned, vec![0]);
    }

    #[test]
    fn failed_trial_without_result_is_ignored_by_default() {
        let mut search = recording(config());
        search.suggest("t0").unwrap();
        search.suggest("t1").unwrap();

        search.on_trial_complete("t0", None, true, false).unwrap();
        search
            .on_trial_complete("t1", Some(&TrialMetrics::new()), true, false)
            .unwrap();

        assert_eq!(search.num_live_trials(), 0);
        assert!(search.optimizer().scores.is_empty());
        assert!(search.optimizer().released.is_empty());
        assert_eq!(search.optimizer().abandoned, vec![0, 1]);
        assert!(search.best_solutions().is_empty());
    }

    #[test]
    fn release_policy_frees_candidate() {
        let mut search = recording(config().with_failure_policy(FailurePolicy::Release));
        search.suggest("t0").unwrap();
        search.on_trial_complete("t0", None, true, false).unwrap();
        assert_eq!(search.optimizer().released, vec![0]);
        assert!(search.optimizer().abandoned.is_empty());
        assert!(search.optimizer().scores.is_empty());
    }

    #[test]
    fn penalize_policy_reports_signed_penalty() {
        let mut search = recording(
            config()
                .with_objective("episode_reward_mean", "max")
                .with_failure_policy(FailurePolicy::Penalize { value: -50.0 }),
        );
        search.suggest("t0").unwrap();
        search.on_trial_complete("t0", None, true, false).unwrap();
        assert_eq!(search.optimizer().scores, vec![50.0]);
    }

    #[test]
    fn early_terminated_results_skip_hook_when_configured() {
        let seen = CollectingHook::default();
        let mut search = recording(config().with_early_stopped_trials(false));
        search.set_result_hook(seen.clone());

        search.suggest("early").unwrap();
        search.suggest("full").unwrap();
        search
            .on_trial_complete("early", Some(&metrics(1.0)), false, true)
            .unwrap();
        search
            .on_trial_complete("full", Some(&metrics(2.0)), false, false)
            .unwrap();

        assert_eq!(*seen.0.lock().unwrap(), vec!["full".to_string()]);
        // The optimizer still learns from the early-terminated trial.
        assert_eq!(search.optimizer().scores, vec![1.0, 2.0]);
    }

    #[test]
    fn hook_sees_early_terminated_results_by_default() {
        let seen = CollectingHook::default();
        let mut search = recording(config());
        search.set_result_hook(seen.clone());

        search.suggest("early").unwrap();
        search
            .on_trial_complete("early", Some(&metrics(1.0)), false, true)
            .unwrap();
        assert_eq!(*seen.0.lock().unwrap(), vec!["early".to_string()]);
    }

    #[test]
    fn on_trial_result_changes_nothing() {
        let mut search = recording(config());
        search.suggest("t0").unwrap();
        search.on_trial_result("t0", &metrics(9.0));
        assert_eq!(search.num_live_trials(), 1);
        assert!(search.optimizer().scores.is_empty());
    }

    #[test]
    fn trait_object_drives_the_adapter() {
        let mut search: Box<dyn SearchAlgorithm> = Box::new(recording(config()));
        assert_eq!(search.name(), "asracos");
        let config = search.suggest("t0").unwrap();
        assert!(config.is_some());
        search
            .on_trial_complete("t0", Some(&metrics(0.5)), false, false)
            .unwrap();
        assert!(!search.is_finished());
    }

    #[test]
    fn save_and_restore_replace_optimizer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.json");

        let mut search = recording(config());
        search.suggest("t0").unwrap();
        search
            .on_trial_complete("t0", Some(&metrics(4.0)), false, false)
            .unwrap();
        search.save(&path).unwrap();

        search.suggest("t1").unwrap();
        search
            .on_trial_complete("t1", Some(&metrics(5.0)), false, false)
            .unwrap();
        assert_eq!(search.optimizer().scores, vec![4.0, 5.0]);

        search.restore(&path).unwrap();
        assert_eq!(search.optimizer().scores, vec![4.0]);
        assert_eq!(search.optimizer().next, 1);
    }

    #[test]
    fn restore_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = recording(config());
        let err = search.restore(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TuneError::Io(_)));
    }
}
