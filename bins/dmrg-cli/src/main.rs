use clap::{Parser, Subcommand};
use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};
use models::ModelKind;
use tracing_subscriber::EnvFilter;

/// DMRG ground-state solver (MPS/MPO, implicit local eigensolver)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chain length
    #[arg(long)]
    n: usize,

    /// Comma-separated bond-dimension schedule
    #[arg(long, default_value = "10,50,100")]
    max_bond: String,

    /// Convergence tolerance (applied to every stage)
    #[arg(long, default_value_t = 1e-10)]
    tol: f64,

    /// Max sweep-pair iterations per stage
    #[arg(long, default_value_t = 10)]
    max_iter: usize,

    /// Min sweep-pair iterations per stage before convergence is accepted
    #[arg(long, default_value_t = 0)]
    min_iter: usize,

    /// Local eigensolver: arnoldi | davidson | exact
    #[arg(long, default_value = "arnoldi")]
    algorithm: String,

    /// Lock the local solver onto the previous sweep's state via overlap
    #[arg(long)]
    preserve_state: bool,

    /// Re-orthonormalize the kept RDM eigenvectors (only used when n-states > 1)
    #[arg(long)]
    orthonormalize: bool,

    /// Number of states carried through the sweep (RDM-averaged truncation if > 1)
    #[arg(long, default_value_t = 1)]
    n_states: usize,

    /// Which carried state's energy to report
    #[arg(long, default_value_t = 0)]
    target_state: usize,

    /// Noise amplitude injected into newly grown bond subspace
    #[arg(long)]
    noise_amplitude: Option<f64>,

    /// Where to save the final MPS snapshot (JSON)
    #[arg(long)]
    persist_path: Option<String>,

    #[command(subcommand)]
    model: Model,
}

#[derive(Subcommand, Debug)]
enum Model {
    /// Transverse-field Ising chain
    Ising {
        #[arg(long, default_value_t = 1.0)]
        h: f64,
        #[arg(long, default_value_t = 1.0)]
        j: f64,
    },
    /// Heisenberg XXZ chain
    Heisenberg {
        #[arg(long, default_value_t = 1.0)]
        jx: f64,
        #[arg(long, default_value_t = 1.0)]
        jy: f64,
        #[arg(long, default_value_t = 1.0)]
        jz: f64,
    },
    /// Tilted-generator TASEP (largest eigenvalue reported, via Polarity::Maximize)
    Tasep {
        #[arg(long)]
        alpha: f64,
        #[arg(long)]
        beta: f64,
        #[arg(long)]
        s: f64,
    },
    /// Tilted-generator partially-asymmetric SEP
    Sep {
        #[arg(long)]
        alpha: f64,
        #[arg(long)]
        gamma: f64,
        #[arg(long)]
        beta: f64,
        #[arg(long)]
        delta: f64,
        #[arg(long)]
        p: f64,
        #[arg(long)]
        q: f64,
        #[arg(long)]
        s: f64,
    },
}

fn parse_schedule_usize(input: &str) -> Schedule<usize> {
    let values: Vec<usize> = input
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if values.len() == 1 {
        Schedule::Scalar(values[0])
    } else {
        Schedule::PerStage(values)
    }
}

fn parse_algorithm(input: &str) -> AlgorithmKind {
    match input.to_ascii_lowercase().as_str() {
        "davidson" => AlgorithmKind::Davidson,
        "exact" => AlgorithmKind::Exact,
        _ => AlgorithmKind::Arnoldi,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let (model_kind, maximize) = match &args.model {
        Model::Ising { h, j } => (ModelKind::Ising { h: *h, j: *j }, false),
        Model::Heisenberg { jx, jy, jz } => {
            let kind = ModelKind::Heisenberg { jx: *jx, jy: *jy, jz: *jz };
            let m = kind.maximize();
            (kind, m)
        }
        Model::Tasep { alpha, beta, s } => {
            let kind = ModelKind::Tasep { alpha: *alpha, beta: *beta, s: *s };
            let m = kind.maximize();
            (kind, m)
        }
        Model::Sep { alpha, gamma, beta, delta, p, q, s } => {
            let kind = ModelKind::Sep {
                alpha: *alpha,
                gamma: *gamma,
                beta: *beta,
                delta: *delta,
                p: *p,
                q: *q,
                s: *s,
            };
            let m = kind.maximize();
            (kind, m)
        }
    };

    let (mpo, _observables) = model_kind.build(args.n);

    let config = SolverConfig {
        n: args.n,
        d: 2,
        max_bond_dim: parse_schedule_usize(&args.max_bond),
        tol: Schedule::Scalar(args.tol),
        max_iter: Schedule::Scalar(args.max_iter),
        min_iter: Schedule::Scalar(args.min_iter),
        initial_guess: InitialGuess::Constant01,
        algorithm: parse_algorithm(&args.algorithm),
        polarity: if maximize { Polarity::Maximize } else { Polarity::Minimize },
        preserve_state: args.preserve_state,
        orthonormalize: args.orthonormalize,
        n_states: args.n_states,
        target_state: args.target_state,
        gauge_site_save: None,
        gauge_site_load: None,
        persist_path: args.persist_path.clone(),
        noise_amplitude: args.noise_amplitude,
        exact_diag_ceiling: 12,
    };

    match dmrg::run(mpo, &config) {
        Ok(report) => {
            println!("energy = {:.10}", report.energy);
            println!("entanglement_entropy = {:.6}", report.entanglement_entropy);
            if let Some(gap) = report.gap {
                println!("gap = {:.10}", gap);
            }
            println!("converged = {}", report.converged);
            println!("stages_run = {}", report.stages_run);
            if report.state_tracking_events > 0 {
                println!("state_tracking_events = {}", report.state_tracking_events);
            }
        }
        Err(e) => {
            eprintln!("dmrg solve failed: {e}");
            std::process::exit(1);
        }
    }
}
