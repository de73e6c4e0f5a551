//! Normalizes a formula to CNF and enumerates its models.
//!
//! Run with:
//!   cargo run --example solve
//!   cargo run --example solve -- --limit 3 --verbose

use clap::Parser;
use simplelog::LevelFilter;

use reasoner_rs::assignment::Schema;
use reasoner_rs::cnf::{is_conjunctive_normal_form, normalize_to_cnf};
use reasoner_rs::eval::truth_table;
use reasoner_rs::expr::{variables, Expr};
use reasoner_rs::sat::{is_satisfiable, solve};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Maximum number of models to print.
    #[clap(long, value_name = "INT")]
    limit: Option<usize>,

    /// Log normalization and solver progress.
    #[clap(long)]
    verbose: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose { LevelFilter::Debug } else { LevelFilter::Info },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let vs = variables("x1 x3 x4 x5")?;
    let [x1, x3, x4, x5] = [0, 1, 2, 3].map(|i| Expr::from(&vs[i]));

    // Already in CNF.
    let f = (x1.clone() | !x5.clone() | x4.clone())
        & (!x1.clone() | x5.clone() | x3.clone() | x4.clone())
        & (!x3.clone() | !x4.clone());
    report(&f, args.limit)?;

    // Needs De Morgan and distribution first.
    let g = !((x1.clone() & !x3) | x4) | (x5 & x1);
    report(&g, args.limit)?;

    Ok(())
}

fn report(expr: &Expr, limit: Option<usize>) -> color_eyre::Result<()> {
    println!();
    println!("formula = {}", expr);
    println!("is CNF: {}", is_conjunctive_normal_form(expr));

    let cnf = normalize_to_cnf(expr)?;
    println!("cnf = {}", cnf);

    let schema = Schema::of(expr);
    println!("{} variables, {} assignments", schema.len(), schema.assignment_count());
    println!("satisfiable: {}", is_satisfiable(expr)?);

    let solutions = solve(expr, limit)?;
    print!("{}", solutions.encoding());
    let mut count = 0;
    for solution in solutions {
        let solution = solution?;
        println!("model #{}: {}", count + 1, solution);
        count += 1;
    }

    let expected = truth_table(expr)?.satisfying().count();
    println!("{} models printed, {} in total", count, expected);
    Ok(())
}
