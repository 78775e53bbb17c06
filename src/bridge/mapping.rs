//! Channel mapping table.
//!
//! Bidirectional lookup between IRC channel names and Discord channel IDs.
//! Built once from configuration and never mutated, so it is shared between
//! tasks as a plain `Arc` without any locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::error::MappingError;

/// A single validated (IRC channel, Discord channel) pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub irc_channel: String,
    pub discord_channel: u64,
}

/// Immutable mapping table.
#[derive(Debug, Default)]
pub struct MappingTable {
    mappings: Vec<Mapping>,
    /// Index: lowercased IRC channel -> mapping.
    by_irc: HashMap<String, usize>,
    /// Index: Discord channel ID -> mapping.
    by_discord: HashMap<u64, usize>,
}

/// Shared mapping table reference for use across async tasks.
pub type SharedMappings = Arc<MappingTable>;

/// IRC channel names are case-insensitive.
fn irc_key(channel: &str) -> String {
    channel.to_ascii_lowercase()
}

impl MappingTable {
    /// Build the table, rejecting any channel that appears in more than one pair.
    ///
    /// Either every pair is accepted or none is; no partial table is returned.
    pub fn build<I, S>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut table = Self::default();

        for (irc_channel, discord_channel) in pairs {
            let irc_channel = irc_channel.into();
            let key = irc_key(&irc_channel);

            if table.by_irc.contains_key(&key) {
                return Err(MappingError::DuplicateIrcChannel {
                    channel: irc_channel,
                });
            }
            if table.by_discord.contains_key(&discord_channel) {
                return Err(MappingError::DuplicateDiscordChannel {
                    channel: discord_channel,
                });
            }

            let idx = table.mappings.len();
            table.by_irc.insert(key, idx);
            table.by_discord.insert(discord_channel, idx);
            table.mappings.push(Mapping {
                irc_channel,
                discord_channel,
            });
        }

        Ok(table)
    }

    pub fn lookup_by_irc(&self, irc_channel: &str) -> Option<&Mapping> {
        self.by_irc
            .get(&irc_key(irc_channel))
            .and_then(|&idx| self.mappings.get(idx))
    }

    pub fn lookup_by_discord(&self, discord_channel: u64) -> Option<&Mapping> {
        self.by_discord
            .get(&discord_channel)
            .and_then(|&idx| self.mappings.get(idx))
    }

    /// IRC channels the listener has to join.
    pub fn irc_channels(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .map(|m| m.irc_channel.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapping_reachable_both_ways() {
        let pairs = vec![("#general", 111), ("#random", 222), ("#dev", 333)];
        let table = MappingTable::build(pairs.clone()).unwrap();

        assert_eq!(table.len(), 3);
        for (irc, discord) in pairs {
            let by_irc = table.lookup_by_irc(irc).unwrap();
            let by_discord = table.lookup_by_discord(discord).unwrap();
            assert_eq!(by_irc, by_discord);
            assert_eq!(by_irc.discord_channel, discord);
            assert_eq!(by_discord.irc_channel, irc);
        }
    }

    #[test]
    fn test_duplicate_irc_channel_fails() {
        let result = MappingTable::build(vec![("#general", 111), ("#general", 222)]);
        assert_eq!(
            result.unwrap_err(),
            MappingError::DuplicateIrcChannel {
                channel: "#general".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_irc_channel_differing_case_fails() {
        let result = MappingTable::build(vec![("#General", 111), ("#general", 222)]);
        assert!(matches!(
            result,
            Err(MappingError::DuplicateIrcChannel { .. })
        ));
    }

    #[test]
    fn test_duplicate_discord_channel_fails() {
        let result = MappingTable::build(vec![("#general", 111), ("#random", 111)]);
        assert_eq!(
            result.unwrap_err(),
            MappingError::DuplicateDiscordChannel { channel: 111 }
        );
    }

    #[test]
    fn test_unmapped_lookups() {
        let table = MappingTable::build(vec![("#general", 111)]).unwrap();
        assert!(table.lookup_by_irc("#nowhere").is_none());
        assert!(table.lookup_by_discord(999).is_none());
    }

    #[test]
    fn test_irc_lookup_case_insensitive() {
        let table = MappingTable::build(vec![("#General", 111)]).unwrap();
        let mapping = table.lookup_by_irc("#general").unwrap();
        assert_eq!(mapping.irc_channel, "#General");
    }

    #[test]
    fn test_irc_channels() {
        let table = MappingTable::build(vec![("#a", 1), ("#b", 2)]).unwrap();
        assert_eq!(table.irc_channels(), vec!["#a", "#b"]);
    }

    #[test]
    fn test_empty_table() {
        let table = MappingTable::build(Vec::<(String, u64)>::new()).unwrap();
        assert!(table.is_empty());
    }
}
