use clap::Parser;
use colored::Colorize;
use safe_multisig::AuthorizerConfig;

use crate::utils::connect;

#[derive(Debug, Parser)]
#[clap(about = "Lists the configured signer slots and the address each source signs for.")]
pub struct SignersCommand {
    #[arg(long, help = "Also check every address against the Safe's owners.")]
    check_owners: bool,
}

impl SignersCommand {
    pub async fn execute(self, config: AuthorizerConfig) -> eyre::Result<()> {
        let slots = config.build_slots()?;
        let safe = match self.check_owners {
            true => Some(connect(&config).await?),
            false => None,
        };

        for slot in &slots {
            println!("{}", slot.label().bright_cyan());

            for source in slot.sources() {
                let address = match source.address().await {
                    Ok(address) => address,
                    Err(e) => {
                        println!("  {} ({}): {}", source.name(), source.kind(), e.to_string().red());
                        continue;
                    }
                };

                let ownership = match &safe {
                    Some(safe) => match safe.is_owner(address).await? {
                        true => " owner".green().to_string(),
                        false => " not an owner".red().to_string(),
                    },
                    None => String::new(),
                };

                println!("  {} ({}): {address}{ownership}", source.name(), source.kind());
            }
        }

        Ok(())
    }
}
