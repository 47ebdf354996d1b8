//! `planboard order ...` subcommands: drive the reorder helpers against a
//! running server.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::client::{PlanboardClient, DEFAULT_URL};
use crate::models::{ItemSummary, Resource};
use crate::reorder;

/// Resource names accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResourceArg {
    Features,
    Comments,
    RoadmapItems,
    Sprints,
    Tasks,
}

impl From<ResourceArg> for Resource {
    fn from(arg: ResourceArg) -> Self {
        match arg {
            ResourceArg::Features => Resource::Features,
            ResourceArg::Comments => Resource::Comments,
            ResourceArg::RoadmapItems => Resource::RoadmapItems,
            ResourceArg::Sprints => Resource::Sprints,
            ResourceArg::Tasks => Resource::Tasks,
        }
    }
}

#[derive(Debug, Args)]
pub struct OrderArgs {
    /// API base URL
    #[arg(long, env = "PLANBOARD_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// User identity sent in the X-User-Id header
    #[arg(long, env = "PLANBOARD_USER")]
    pub user: String,

    /// API key, if the server requires one
    #[arg(long, env = "PLANBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub action: OrderAction,
}

#[derive(Debug, Subcommand)]
pub enum OrderAction {
    /// Print items in their current order
    List {
        #[arg(value_enum)]
        resource: ResourceArg,
        /// Project id (feature id for comments)
        scope: Uuid,
    },
    /// Move an item one place up
    MoveUp {
        #[arg(value_enum)]
        resource: ResourceArg,
        scope: Uuid,
        id: String,
    },
    /// Move an item one place down
    MoveDown {
        #[arg(value_enum)]
        resource: ResourceArg,
        scope: Uuid,
        id: String,
    },
    /// Put the listed ids first, in the given order; the rest keep their relative order
    Set {
        #[arg(value_enum)]
        resource: ResourceArg,
        scope: Uuid,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

pub async fn run(args: OrderArgs) -> Result<()> {
    let client = PlanboardClient::new(args.url, args.api_key, Some(args.user));

    match args.action {
        OrderAction::List { resource, scope } => {
            let items = fetch(&client, resource.into(), scope).await?;
            print_items(&items);
        }
        OrderAction::MoveUp { resource, scope, id } => {
            let resource = Resource::from(resource);
            let items = fetch(&client, resource, scope).await?;
            ensure_present(&items, &id)?;
            let items = reorder::move_up(&client, resource, &items, &id).await?;
            print_items(&items);
        }
        OrderAction::MoveDown { resource, scope, id } => {
            let resource = Resource::from(resource);
            let items = fetch(&client, resource, scope).await?;
            ensure_present(&items, &id)?;
            let items = reorder::move_down(&client, resource, &items, &id).await?;
            print_items(&items);
        }
        OrderAction::Set {
            resource,
            scope,
            ids,
        } => {
            let resource = Resource::from(resource);
            let items = fetch(&client, resource, scope).await?;
            let mut items = arrange(items, &ids)?;
            reorder::save_sequence(&client, resource, &mut items).await?;
            print_items(&items);
        }
    }

    Ok(())
}

async fn fetch(client: &PlanboardClient, resource: Resource, scope: Uuid) -> Result<Vec<ItemSummary>> {
    client
        .list_items(resource, scope)
        .await
        .with_context(|| format!("Failed to list {} items", resource))
}

fn ensure_present(items: &[ItemSummary], id: &str) -> Result<()> {
    if !items.iter().any(|item| item.id.to_string() == id) {
        bail!("No item with id {}", id);
    }
    Ok(())
}

/// Move the named ids to the front in the given order.
fn arrange(items: Vec<ItemSummary>, ids: &[String]) -> Result<Vec<ItemSummary>> {
    let mut rest = items;
    let mut front = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(index) = rest.iter().position(|item| &item.id.to_string() == id) else {
            bail!("No item with id {}", id);
        };
        front.push(rest.remove(index));
    }
    front.extend(rest);
    Ok(front)
}

fn print_items(items: &[ItemSummary]) {
    for item in items {
        println!("{:>4}  {}  {}", item.order, item.id, item.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: Uuid, order: i64) -> ItemSummary {
        ItemSummary {
            id,
            order,
            title: Some(format!("item {}", order)),
            name: None,
            body: None,
        }
    }

    #[test]
    fn arrange_puts_named_ids_first() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let items = vec![summary(a, 0), summary(b, 1), summary(c, 2)];

        let arranged = arrange(items, &[c.to_string(), a.to_string()]).unwrap();

        let ids: Vec<_> = arranged.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![c, a, b]);
    }

    #[test]
    fn arrange_rejects_unknown_and_repeated_ids() {
        let a = Uuid::new_v4();
        assert!(arrange(vec![summary(a, 0)], &[Uuid::new_v4().to_string()]).is_err());
        assert!(arrange(vec![summary(a, 0)], &[a.to_string(), a.to_string()]).is_err());
    }
}
