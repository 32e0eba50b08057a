use color_eyre::eyre::{
    Result,
    eyre,
};
use rps_client::{
    cache,
    client,
};
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: rps-client [--testnet | --devnet | --local] [--node-url <url>]\n\
         [--wallet-url <url>] [--module <addr>]\n\
         [--cache-dir <path>] [--no-cache]\n\
         \n\
         Flags:\n\
           --testnet           Connect to the testnet full node (default {})\n\
           --devnet            Connect to the devnet full node (default {})\n\
           --local             Connect to a local full node (default {})\n\
           --node-url <url>    Override the full node URL for the selected network\n\
           --wallet-url <url>  Wallet daemon endpoint (default {})\n\
           --module <addr>     Address of the rock_paper_scissors module\n\
           --cache-dir <path>  Override the config/cache directory\n\
           --no-cache          Skip the on-disk history mirror",
        client::DEFAULT_TESTNET_NODE_URL,
        client::DEFAULT_DEVNET_NODE_URL,
        client::DEFAULT_LOCAL_NODE_URL,
        client::DEFAULT_WALLET_URL,
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    #[derive(Clone, Copy)]
    enum NetworkFlag {
        Testnet,
        Devnet,
        Local,
    }

    let mut args = std::env::args().skip(1);
    let mut network_flag: Option<NetworkFlag> = None;
    let mut custom_url: Option<String> = None;
    let mut wallet_url: Option<String> = None;
    let mut module_address: Option<String> = None;
    let mut cache_dir: Option<String> = None;
    let mut use_cache = true;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--testnet" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --testnet/--devnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Testnet);
            }
            "--devnet" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --testnet/--devnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Devnet);
            }
            "--local" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --testnet/--devnet/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Local);
            }
            "--node-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--node-url requires a URL argument"))?;
                if custom_url.is_some() {
                    return Err(eyre!("--node-url may only be specified once"));
                }
                if network_flag.is_none() {
                    return Err(eyre!(
                        "--node-url must follow a network flag (--testnet/--devnet/--local)"
                    ));
                }
                custom_url = Some(url);
            }
            "--wallet-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-url requires a URL argument"))?;
                if wallet_url.is_some() {
                    return Err(eyre!("--wallet-url may only be specified once"));
                }
                wallet_url = Some(url);
            }
            "--module" => {
                let addr = args
                    .next()
                    .ok_or_else(|| eyre!("--module requires an address argument"))?;
                if module_address.is_some() {
                    return Err(eyre!("--module may only be specified once"));
                }
                module_address = Some(addr);
            }
            "--cache-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--cache-dir requires a path argument"))?;
                if cache_dir.is_some() {
                    return Err(eyre!("--cache-dir may only be specified once"));
                }
                cache_dir = Some(dir);
            }
            "--no-cache" => use_cache = false,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let network = match network_flag {
        None => {
            return Err(eyre!(
                "Select a network with --testnet, --devnet, or --local"
            ));
        }
        Some(NetworkFlag::Testnet) => client::NetworkTarget::Testnet {
            url: custom_url
                .unwrap_or_else(|| client::DEFAULT_TESTNET_NODE_URL.to_string()),
        },
        Some(NetworkFlag::Devnet) => client::NetworkTarget::Devnet {
            url: custom_url
                .unwrap_or_else(|| client::DEFAULT_DEVNET_NODE_URL.to_string()),
        },
        Some(NetworkFlag::Local) => client::NetworkTarget::LocalNode {
            url: custom_url
                .unwrap_or_else(|| client::DEFAULT_LOCAL_NODE_URL.to_string()),
        },
    };

    Ok(client::AppConfig {
        network,
        wallet_url: wallet_url
            .unwrap_or_else(|| client::DEFAULT_WALLET_URL.to_string()),
        module_address: module_address
            .unwrap_or_else(|| client::DEFAULT_MODULE_ADDRESS.to_string()),
        cache_dir,
        use_cache,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = parse_cli_args()?;

    // Logs go to a rolling file; stdout belongs to the TUI.
    let log_dir = cache::resolve_config_dir(config.cache_dir.as_deref())?;
    let (writer, _guard) =
        tracing_appender::non_blocking(rolling::daily(&log_dir, "rps-client.log"));
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    tracing::info!("starting rps client");

    client::run_app(config).await
}
