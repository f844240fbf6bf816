use clap::Parser;

/// Seed the users table with fake data.
#[derive(Debug, Parser)]
#[command(name = "user-seeder")]
#[command(about = "Seed the users table with fake data", long_about = None)]
pub struct Cli {
    /// Number of fake users to generate
    #[arg(short = 'n', long = "number", default_value_t = 10)]
    pub number: usize,
}
