use clap::Parser;

/// Drive a bounded-concurrency scheduler with synthetic tasks and report
/// what each task saw when it started.
#[derive(Parser, Debug)]
#[command(name = "taskq", version, about = "Run synthetic workloads through the taskq scheduler")]
pub struct CliArgs {
    /// Path to a TOML file with scheduler options (e.g. `limit = 4`)
    #[arg(long, env = "TASKQ_CONFIG")]
    pub config: Option<String>,

    /// Maximum number of queued tasks running at once (overrides the config file)
    #[arg(long, env = "TASKQ_LIMIT")]
    pub limit: Option<usize>,

    /// Number of tasks to submit
    #[arg(long, default_value_t = 20)]
    pub tasks: u64,

    /// Shortest simulated task duration in milliseconds
    #[arg(long, default_value_t = 10)]
    pub min_ms: u64,

    /// Longest simulated task duration in milliseconds
    #[arg(long, default_value_t = 100)]
    pub max_ms: u64,

    /// Number of distinct priority levels assigned round-robin
    #[arg(long, default_value_t = 3)]
    pub priority_levels: i64,

    /// Submit every Nth task as immediate (0 = never)
    #[arg(long, default_value_t = 0)]
    pub immediate_every: u64,

    /// Make every Nth task fail (0 = never)
    #[arg(long, default_value_t = 0)]
    pub fail_every: u64,

    /// Fail tasks that run longer than this many milliseconds (0 = no timeout)
    #[arg(long, default_value_t = 0)]
    pub timeout_ms: u64,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

impl CliArgs {
    /// Deterministic spread of durations across `[min_ms, max_ms]`.
    pub fn duration_for(&self, task: u64) -> u64 {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        let spread = task.wrapping_mul(37);
        match (hi - lo).checked_add(1) {
            Some(span) => lo + spread % span,
            // The range covers every u64.
            None => spread,
        }
    }

    pub fn priority_for(&self, task: u64) -> i64 {
        if self.priority_levels <= 1 {
            0
        } else {
            (task as i64) % self.priority_levels
        }
    }

    pub fn is_immediate(&self, task: u64) -> bool {
        self.immediate_every > 0 && (task + 1) % self.immediate_every == 0
    }

    pub fn should_fail(&self, task: u64) -> bool {
        self.fail_every > 0 && (task + 1) % self.fail_every == 0
    }
}
