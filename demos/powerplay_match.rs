// Demonstration: play a rendered Powerplay match, then evaluate a baseline policy.
//
// Build/run from this repo root:
//   cargo run --example powerplay_match -- --policy greedy --episodes 20 --share group
//   cargo run --example powerplay_match -- --variant movement --policy random
//
// Logging follows RUST_LOG, e.g. RUST_LOG=marlsim=trace.

use std::env;
use std::process;

use marlsim::env::{PolicyMapping, SharePolicy};
use marlsim::metrics::EvaluationMetrics;
use marlsim::policy::{GreedyJunctionPolicy, Policy, RandomPolicy};
use marlsim::powerplay::StepInfo;
use marlsim::{MovementPowerplay, MultiAgentEnv, Powerplay, PowerplayConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marlsim=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("greedy");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let algorithm = arg_value(&args, "--algorithm").unwrap_or("mappo");
    let share: SharePolicy = match arg_value(&args, "--share").unwrap_or("group").parse() {
        Ok(share) => share,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let config = PowerplayConfig {
        seed,
        ..Default::default()
    };
    let variant = arg_value(&args, "--variant").unwrap_or("standard");
    let policy_name = match (variant, policy_name) {
        // Greedy junction picks are station ids; direct control needs moves.
        ("movement", "greedy") => "random",
        (_, name) => name,
    };

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(seed)),
        "greedy" => Box::new(GreedyJunctionPolicy::new()),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'greedy' or 'random'.", other);
            process::exit(2);
        }
    };

    let result = match variant {
        "standard" => Powerplay::new(config)
            .map(|mut game| run(&mut game, share, algorithm, policy.as_mut(), episodes)),
        "movement" => MovementPowerplay::new(config)
            .map(|mut game| run(&mut game, share, algorithm, policy.as_mut(), episodes)),
        other => {
            eprintln!("Unknown --variant '{}'; expected 'standard' or 'movement'.", other);
            process::exit(2);
        }
    };
    if let Err(e) = result {
        eprintln!("invalid configuration: {}", e);
        process::exit(2);
    }
}

fn run<E>(
    game: &mut E,
    share: SharePolicy,
    algorithm: &str,
    policy: &mut dyn Policy,
    episodes: usize,
) where
    E: MultiAgentEnv<Action = usize, Info = StepInfo>,
{
    let mapping = match PolicyMapping::resolve(
        &game.env_info().policy_mapping,
        game.agents(),
        share,
        algorithm,
    ) {
        Ok(mapping) => mapping,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    println!("Policy sharing: {} ({})", mapping.share, algorithm);
    for agent in game.agents() {
        println!("  {:<7} -> {}", agent, mapping.policy_for(agent).unwrap_or("?"));
    }

    let mut obs = game.reset();
    let mut ticks = 0u32;
    loop {
        let actions = policy.select_actions(&obs);
        let result = match game.step(&actions) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("step failed: {}", e);
                process::exit(1);
            }
        };
        ticks += 1;
        if ticks % 60 == 0 || result.is_done() {
            println!("\n{}", game.render());
        }
        if result.is_done() {
            if let Some(outcome) = result.info.outcome {
                println!(
                    "\nFinal: red {} (circuit {})  blue {} (circuit {})",
                    outcome.red.score, outcome.red.circuit, outcome.blue.score, outcome.blue.circuit
                );
            }
            break;
        }
        obs = result.observations;
    }

    match EvaluationMetrics::evaluate(game, policy, episodes) {
        Ok(metrics) => {
            println!("\nPolicy: {}", policy.name());
            println!("{}", metrics);
        }
        Err(e) => {
            eprintln!("evaluation failed: {}", e);
            process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
