// Command line tooling: wallets, genesis blocks and chain inspection

use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use crowdchain::chain::Chain;
use crowdchain::consensus::{MineOutcome, Miner, validate_chain};
use crowdchain::core::Block;
use crowdchain::wallet::RsaKeys;

#[derive(Parser)]
#[command(name = "crowdchain", about = "Proof-of-work chain with crowdfunding contracts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an RSA key pair and write it as DER files
    GenWallet {
        /// Path for the public key, the private key lands next to it
        #[arg(long, default_value = "public.der")]
        public: PathBuf,
        #[arg(long, default_value = "private.der")]
        private: PathBuf,
    },
    /// Mine a genesis block and write a single-block chain file
    GenGenesis {
        #[arg(long, default_value = "chain.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 20)]
        difficulty_bits: u32,
    },
    /// Validate a chain file against the consensus rules
    Validate {
        chain: PathBuf,
        #[arg(long, default_value_t = 100)]
        block_reward: u64,
    },
    /// Print a summary of a chain file
    Show { chain: PathBuf },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(error) = run(cli.command) {
        eprintln!("error: {error:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::GenWallet { public, private } => {
            let keys = RsaKeys::generate().context("key generation failed")?;
            keys.save(&public, &private).context("writing key files failed")?;
            println!("wrote {} and {}", public.display(), private.display());
            Ok(())
        }
        Command::GenGenesis { out, difficulty_bits } => {
            let miner = Miner::new(difficulty_bits, 0);
            let cancel = AtomicBool::new(false);
            match miner.mine(&Block::genesis(), &cancel, None) {
                MineOutcome::Mined(block) => {
                    println!("genesis mined: {}", block.hash);
                    let chain = Chain::new(vec![block]);
                    chain.save(&out).context("writing chain file failed")?;
                    println!("wrote {}", out.display());
                    Ok(())
                }
                MineOutcome::Cancelled | MineOutcome::Exhausted => {
                    bail!("no solution found at difficulty {difficulty_bits}")
                }
            }
        }
        Command::Validate { chain, block_reward } => {
            let chain = Chain::load(&chain).context("reading chain file failed")?;
            validate_chain(&chain, block_reward)?;
            println!("chain is valid: {} blocks", chain.len());
            Ok(())
        }
        Command::Show { chain } => {
            let chain = Chain::load(&chain).context("reading chain file failed")?;
            for block in chain.blocks() {
                println!(
                    "#{:<4} {} txs={} contracts={} ts={}",
                    block.id,
                    block.hash,
                    block.body.transactions.len(),
                    block.body.contracts.len(),
                    block.timestamp,
                );
            }
            Ok(())
        }
    }
}
