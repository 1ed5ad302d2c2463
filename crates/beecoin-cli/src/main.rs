use anyhow::Result;
use beecoin_core::TransactionRequest;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "beecoin-cli")]
#[command(about = "CLI client for the BeeCoin ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, env = "BEECOIN_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender address; omit for a sender-less transfer
        #[arg(long)]
        from: Option<String>,
        /// Recipient address
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value_t = 0)]
        fee: u64,
        /// Hex encoded signature produced by a wallet
        #[arg(long)]
        signature: Option<String>,
    },
    /// Mine the pending pool into a new block
    Mine {
        /// Address to credit; the node id when omitted
        #[arg(long)]
        miner: Option<String>,
    },
    /// Print the node's full chain
    Chain,
    /// Register peers with the node
    Register {
        /// Peer URLs, e.g. http://127.0.0.1:5001
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Run consensus against the registered peers
    Resolve,
    /// Replay the chain for an address's balance
    Balance { address: String },
}

#[derive(Serialize)]
struct RegisterBody {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();
    let request = match cli.cmd {
        Command::Submit {
            from,
            to,
            amount,
            fee,
            signature,
        } => {
            let tx = TransactionRequest {
                sender: from,
                recipient: Some(to),
                amount: Some(amount),
                fee: Some(fee),
                timestamp: None,
                signature,
            };
            client.post(format!("{node}/transactions/new")).json(&tx)
        }
        Command::Mine { miner } => {
            let req = client.get(format!("{node}/mine"));
            match miner {
                Some(miner) => req.query(&[("miner", miner)]),
                None => req,
            }
        }
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Register { peers } => client
            .post(format!("{node}/nodes/register"))
            .json(&RegisterBody { nodes: peers }),
        Command::Resolve => client.get(format!("{node}/nodes/resolve")),
        Command::Balance { address } => client.get(format!("{node}/balance/{address}")),
    };

    debug!(?request, "sending");
    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
