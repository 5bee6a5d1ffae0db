//! Read-only listing of recent tables, for a dealer or lobby view.

use serde_json::Value;

use crate::error::StoreError;
use crate::records::{GameRecord, PlayerRecord};
use crate::store::{self, Collection, OrderBy, RecordStore, predicate};
use crate::table::TableSnapshot;

/// Returns up to `limit` of the most recently created tables with their
/// seated players in seat order.
///
/// Snapshots carry no viewer, so only table-wide fields are meaningful.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a record is malformed.
pub async fn list_tables<S: RecordStore + ?Sized>(
    store: &S,
    limit: usize,
    dealer_stands_on: u8,
) -> Result<Vec<TableSnapshot>, StoreError> {
    let games = store
        .list(Collection::Games, &OrderBy::newest_first(), limit)
        .await?;

    let mut tables = Vec::with_capacity(games.len());
    for fields in games {
        let game: GameRecord = store::decode(fields)?;
        let records = store
            .filter(
                Collection::Players,
                &predicate([
                    ("game_id", Value::from(game.id.as_str())),
                    ("is_active", Value::from(true)),
                ]),
            )
            .await?;
        let mut players = records
            .into_iter()
            .map(store::decode)
            .collect::<Result<Vec<PlayerRecord>, _>>()?;
        players.sort_by_key(|p| p.seat_position);

        tables.push(TableSnapshot {
            game,
            players,
            viewer: None,
            dealer_stands_on,
        });
    }

    tracing::debug!(tables = tables.len(), "listed tables");
    Ok(tables)
}
