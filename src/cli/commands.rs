//! CLI command implementations

use crate::cli::args::{Cli, Command, InfoArgs, OutputFormat, ScheduleArgs, ValidateArgs};
use crate::cli::logging::{log, LogLevel};
use crate::config::RunConfig;
use crate::schedule::{build_schedule, OneCycle, SchedulePoint, StepBudget};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    match cli.command {
        Command::Validate(args) => run_validate(args, log_level),
        Command::Info(args) => run_info(args, log_level),
        Command::Schedule(args) => run_schedule(args, log_level),
    }
}

fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    let config = RunConfig::load(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!("Configuration valid: {}", config.global.name),
    );

    if args.detailed {
        log(level, LogLevel::Normal, &format_detail(&config));
    } else {
        // --verbose gets the full report without asking for --detailed
        log(level, LogLevel::Verbose, &format_detail(&config));
    }

    Ok(())
}

fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let config = RunConfig::load(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration Info:");
            println!();
            println!("{}", format_detail(&config));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn run_schedule(args: ScheduleArgs, level: LogLevel) -> Result<(), String> {
    let config = RunConfig::load(&args.config).map_err(|e| format!("Config error: {e}"))?;

    let budget = StepBudget {
        epochs: config.training.epochs,
        batches_per_epoch: args.batches_per_epoch,
        accumulation_steps: config.data.accumulation_steps,
    };
    let schedule = build_schedule(&config.scheduler, budget.total_steps(), budget)
        .map_err(|e| format!("Schedule error: {e}"))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Step budget: {} epochs * ceil({} / {}) = {} optimizer steps, warm-up ends at step {}",
            budget.epochs,
            budget.batches_per_epoch,
            budget.accumulation_steps,
            budget.total_steps(),
            schedule.warmup_end(),
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "One-cycle schedule: {} optimizer steps ({} epochs, {} micro-batches/epoch, accumulation {})",
            schedule.total_steps(),
            config.training.epochs,
            args.batches_per_epoch,
            config.data.accumulation_steps,
        ),
    );
    println!("{:>8}  {:>12}  {:>10}", "step", "lr", "momentum");

    for step in preview_steps(&schedule, args.every) {
        println!("{}", format_schedule_row(step, schedule.at(step)));
    }

    Ok(())
}

/// Steps to print: phase boundaries by default, a stride when `--every` is
/// given. The last step is always included.
fn preview_steps(schedule: &OneCycle, every: Option<usize>) -> Vec<usize> {
    let last = schedule.total_steps() - 1;
    let mut steps = match every {
        Some(stride) => (0..=last).step_by(stride.max(1)).collect(),
        None => vec![0, schedule.warmup_end(), last],
    };
    if steps.last() != Some(&last) {
        steps.push(last);
    }
    steps.dedup();
    steps
}

fn format_schedule_row(step: usize, point: SchedulePoint) -> String {
    match point.momentum {
        Some(momentum) => format!("{step:>8}  {:>12.6e}  {momentum:>10.4}", point.lr),
        None => format!("{step:>8}  {:>12.6e}  {:>10}", point.lr, "-"),
    }
}

fn format_detail(config: &RunConfig) -> String {
    [
        format!("Run: {}", config.global.name),
        format!("Dataset: {}", config.data.dataset),
        format!(
            "Batches: size {} with {} accumulation steps",
            config.data.batch_size, config.data.accumulation_steps
        ),
        format!(
            "Model: {} layers, hidden dim {}",
            config.model.num_layers, config.model.hidden_dim
        ),
        format!(
            "Optimizer: {} (lr={}, clip={})",
            config.optimizer.kind, config.optimizer.lr, config.optimizer.clip_grad_norm
        ),
        format!(
            "Scheduler: {} (lr_max={}, pct_start={})",
            config.scheduler.kind, config.scheduler.lr_max, config.scheduler.pct_start
        ),
        format!(
            "Training: {} epochs, checkpoint every {}",
            config.training.epochs, config.training.checkpt_save_interval
        ),
    ]
    .join("\n")
}
