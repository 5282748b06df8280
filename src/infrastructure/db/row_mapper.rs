use anyhow::{anyhow, Context, Result};
use sqlx::any::{Any, AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::Row;

use crate::domain::records::{
    MatchEventRecord, MatchPlayerRecord, PlayerSource, PlayerStatRecord, TeamStatRecord,
};
use crate::domain::value_objects::{EventKey, MatchPlayerKey, Side};
use crate::infrastructure::db::sql_utils::{
    TableSpec, MATCH_EVENTS, MATCH_PLAYERS, PLAYER_STATS, TEAM_STATS,
};

/// A bind value in the small set of types every `Any` driver decodes alike.
/// Booleans travel as 0/1 integers, timestamps as RFC 3339 text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i64>),
    Real(Option<f64>),
    Text(Option<String>),
}

impl SqlValue {
    fn int(v: i32) -> Self {
        SqlValue::Int(Some(i64::from(v)))
    }

    fn opt_int(v: Option<i32>) -> Self {
        SqlValue::Int(v.map(i64::from))
    }

    fn text(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

pub fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
    }
}

/// A record that maps onto one per-fixture table.
///
/// `values` returns the columns in `TableSpec::columns` order; `from_row`
/// reads them back by name.
pub trait RowRecord: Sized + Send + Sync {
    fn table() -> &'static TableSpec;
    fn values(&self) -> Vec<SqlValue>;
    fn from_row(row: &AnyRow) -> Result<Self>;
}

// ─── Column readers ───

fn get_i32(row: &AnyRow, col: &str) -> Result<i32> {
    let v: i64 = row.try_get(col).with_context(|| format!("Failed to read column {col}"))?;
    i32::try_from(v).with_context(|| format!("Column {col} out of range: {v}"))
}

fn get_opt_i32(row: &AnyRow, col: &str) -> Result<Option<i32>> {
    let v: Option<i64> = row.try_get(col).with_context(|| format!("Failed to read column {col}"))?;
    v.map(|v| i32::try_from(v).with_context(|| format!("Column {col} out of range: {v}")))
        .transpose()
}

fn get_text(row: &AnyRow, col: &str) -> Result<String> {
    row.try_get(col).with_context(|| format!("Failed to read column {col}"))
}

fn get_opt_text(row: &AnyRow, col: &str) -> Result<Option<String>> {
    row.try_get(col).with_context(|| format!("Failed to read column {col}"))
}

fn get_side(row: &AnyRow) -> Result<Side> {
    let raw = get_text(row, "side")?;
    Side::parse(&raw).ok_or_else(|| anyhow!("Unknown side '{raw}'"))
}

fn get_opt_key(row: &AnyRow, col: &str) -> Result<Option<MatchPlayerKey>> {
    Ok(get_opt_text(row, col)?.map(MatchPlayerKey::from_stored))
}

// ─── Records ───

impl RowRecord for MatchPlayerRecord {
    fn table() -> &'static TableSpec {
        &MATCH_PLAYERS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(self.key.as_str()),
            SqlValue::Int(self.provider_id),
            SqlValue::Text(self.name.clone()),
            SqlValue::opt_int(self.number),
            SqlValue::Text(self.position.clone()),
            SqlValue::text(self.side.as_str()),
            SqlValue::Int(Some(i64::from(self.non_lineup_player))),
            SqlValue::text(self.source.as_str()),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self> {
        let source = get_text(row, "source")?;
        let non_lineup: i64 = row.try_get("non_lineup_player")?;
        Ok(Self {
            key: MatchPlayerKey::from_stored(get_text(row, "player_key")?),
            provider_id: row.try_get("provider_id")?,
            name: get_opt_text(row, "name")?,
            number: get_opt_i32(row, "number")?,
            position: get_opt_text(row, "position")?,
            side: get_side(row)?,
            non_lineup_player: non_lineup != 0,
            source: PlayerSource::parse(&source)
                .ok_or_else(|| anyhow!("Unknown player source '{source}'"))?,
        })
    }
}

impl RowRecord for MatchEventRecord {
    fn table() -> &'static TableSpec {
        &MATCH_EVENTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(self.key.as_str()),
            SqlValue::text(self.side.as_str()),
            SqlValue::int(self.minute),
            SqlValue::opt_int(self.extra_minute),
            SqlValue::text(&self.kind),
            SqlValue::Text(self.detail.clone()),
            SqlValue::Text(self.player_key.as_ref().map(|k| k.as_str().to_string())),
            SqlValue::Text(self.assist_key.as_ref().map(|k| k.as_str().to_string())),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self> {
        Ok(Self {
            key: EventKey(get_text(row, "event_key")?),
            side: get_side(row)?,
            minute: get_i32(row, "minute")?,
            extra_minute: get_opt_i32(row, "extra_minute")?,
            kind: get_text(row, "kind")?,
            detail: get_opt_text(row, "detail")?,
            player_key: get_opt_key(row, "player_key")?,
            assist_key: get_opt_key(row, "assist_key")?,
        })
    }
}

impl RowRecord for PlayerStatRecord {
    fn table() -> &'static TableSpec {
        &PLAYER_STATS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(self.player_key.as_str()),
            SqlValue::text(self.side.as_str()),
            SqlValue::opt_int(self.minutes_played),
            SqlValue::Real(self.rating),
            SqlValue::int(self.goals),
            SqlValue::int(self.assists),
            SqlValue::int(self.shots),
            SqlValue::int(self.passes),
            SqlValue::int(self.tackles),
            SqlValue::int(self.yellow_cards),
            SqlValue::int(self.red_cards),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self> {
        Ok(Self {
            player_key: MatchPlayerKey::from_stored(get_text(row, "player_key")?),
            side: get_side(row)?,
            minutes_played: get_opt_i32(row, "minutes_played")?,
            rating: row.try_get("rating")?,
            goals: get_i32(row, "goals")?,
            assists: get_i32(row, "assists")?,
            shots: get_i32(row, "shots")?,
            passes: get_i32(row, "passes")?,
            tackles: get_i32(row, "tackles")?,
            yellow_cards: get_i32(row, "yellow_cards")?,
            red_cards: get_i32(row, "red_cards")?,
        })
    }
}

impl RowRecord for TeamStatRecord {
    fn table() -> &'static TableSpec {
        &TEAM_STATS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(self.side.as_str()),
            SqlValue::Real(self.possession),
            SqlValue::int(self.shots),
            SqlValue::int(self.shots_on_target),
            SqlValue::int(self.corners),
            SqlValue::int(self.fouls),
            SqlValue::int(self.offsides),
            SqlValue::int(self.yellow_cards),
            SqlValue::int(self.red_cards),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self> {
        Ok(Self {
            side: get_side(row)?,
            possession: row.try_get("possession")?,
            shots: get_i32(row, "shots")?,
            shots_on_target: get_i32(row, "shots_on_target")?,
            corners: get_i32(row, "corners")?,
            fouls: get_i32(row, "fouls")?,
            offsides: get_i32(row, "offsides")?,
            yellow_cards: get_i32(row, "yellow_cards")?,
            red_cards: get_i32(row, "red_cards")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches_table<T: RowRecord>(record: &T) {
        assert_eq!(record.values().len(), T::table().columns.len(), "{}", T::table().name);
    }

    #[test]
    fn values_line_up_with_table_columns() {
        let key = MatchPlayerKey::derive(Some(4), None).unwrap();
        assert_matches_table(&MatchPlayerRecord {
            key: key.clone(),
            provider_id: Some(4),
            name: None,
            number: Some(10),
            position: None,
            side: Side::Home,
            non_lineup_player: true,
            source: PlayerSource::Event,
        });
        assert_matches_table(&MatchEventRecord {
            key: EventKey("home:12+0:goal:id:4#1".into()),
            side: Side::Home,
            minute: 12,
            extra_minute: None,
            kind: "goal".into(),
            detail: None,
            player_key: Some(key.clone()),
            assist_key: None,
        });
        assert_matches_table(&PlayerStatRecord {
            player_key: key,
            side: Side::Home,
            minutes_played: Some(90),
            rating: Some(7.1),
            goals: 1,
            assists: 0,
            shots: 3,
            passes: 40,
            tackles: 2,
            yellow_cards: 0,
            red_cards: 0,
        });
        assert_matches_table(&TeamStatRecord {
            side: Side::Away,
            possession: None,
            shots: 0,
            shots_on_target: 0,
            corners: 0,
            fouls: 0,
            offsides: 0,
            yellow_cards: 0,
            red_cards: 0,
        });
    }

    #[test]
    fn flags_and_keys_are_encoded_as_plain_values() {
        let record = MatchPlayerRecord {
            key: MatchPlayerKey::derive(None, Some(" Jo Doe ")).unwrap(),
            provider_id: None,
            name: Some("Jo Doe".into()),
            number: None,
            position: None,
            side: Side::Away,
            non_lineup_player: true,
            source: PlayerSource::Statistics,
        };
        let values = record.values();
        assert_eq!(values[0], SqlValue::Text(Some("name:jo doe".into())));
        assert_eq!(values[5], SqlValue::Text(Some("away".into())));
        assert_eq!(values[6], SqlValue::Int(Some(1)));
        assert_eq!(values[7], SqlValue::Text(Some("statistics".into())));
    }
}
