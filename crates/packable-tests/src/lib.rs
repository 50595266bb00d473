//! Shared record types and adapters for the Packable integration tests and
//! benchmarks.
//!
//! | Type      | Fields                                                        |
//! |-----------|---------------------------------------------------------------|
//! | `Item`    | two scalars                                                   |
//! | `Data`    | optional message, optional `Item` array                       |
//! | `Profile` | every field kind: scalars, strings, bytes, arrays, a map,     |
//! |           | a nullable object array and the compact array layouts         |

use std::collections::BTreeMap;

use packable_compact::{CompactDecoderExt, CompactEncoderExt};
use packable_decoder::{DecodeError, PackDecoder, UnpackAdapter};
use packable_encoder::{EncodeError, PackAdapter, PackEncoder};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Item {
    pub a: i32,
    pub b: i64,
}

impl Item {
    #[must_use]
    pub fn new(a: i32, b: i64) -> Self {
        Self { a, b }
    }
}

pub struct ItemAdapter;

impl PackAdapter<Item> for ItemAdapter {
    fn encode(&self, encoder: &mut PackEncoder, value: &Item) -> Result<(), EncodeError> {
        encoder.put_int(0, value.a)?.put_long(1, value.b)?;
        Ok(())
    }
}

impl UnpackAdapter<Item> for ItemAdapter {
    fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<Item, DecodeError> {
        Ok(Item {
            a: decoder.get_int(0)?.unwrap_or_default(),
            b: decoder.get_long(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Data {
    pub msg: Option<String>,
    pub items: Option<Vec<Item>>,
}

pub struct DataAdapter;

impl PackAdapter<Data> for DataAdapter {
    fn encode(&self, encoder: &mut PackEncoder, value: &Data) -> Result<(), EncodeError> {
        if let Some(msg) = &value.msg {
            encoder.put_str(0, msg)?;
        }
        if let Some(items) = &value.items {
            encoder.put_object_array(1, items, &ItemAdapter)?;
        }
        Ok(())
    }
}

impl UnpackAdapter<Data> for DataAdapter {
    fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<Data, DecodeError> {
        Ok(Data {
            msg: decoder.get_str(0)?.map(str::to_owned),
            items: decoder.get_object_array(1, &ItemAdapter)?,
        })
    }
}

/// Enum stored by ordinal in `Profile::roles`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Guest,
    Member,
    Admin,
}

impl Role {
    #[must_use]
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Guest),
            1 => Some(Self::Member),
            2 => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub verified: bool,
    pub balance: f64,
    pub offset: i32,
    pub avatar: Vec<u8>,
    pub tags: Vec<String>,
    pub nicknames: Vec<Option<String>>,
    pub history: Vec<i64>,
    pub weights: Vec<f32>,
    pub attributes: BTreeMap<String, i64>,
    pub best: Option<Item>,
    pub friends: Vec<Option<Item>>,
    pub flags: Vec<bool>,
    pub roles: Vec<Role>,
    pub visits: Vec<i32>,
    pub ratings: Vec<f64>,
}

pub struct ProfileAdapter;

impl PackAdapter<Profile> for ProfileAdapter {
    fn encode(&self, encoder: &mut PackEncoder, value: &Profile) -> Result<(), EncodeError> {
        encoder
            .put_long(0, value.id)?
            .put_str(1, &value.name)?
            .put_int(2, value.age)?
            .put_bool(3, value.verified)?
            .put_c_double(4, value.balance)?
            .put_sint(5, value.offset)?
            .put_bytes(6, &value.avatar)?
            .put_str_array(7, &value.tags)?;
        let nicknames: Vec<Option<&str>> = value.nicknames.iter().map(Option::as_deref).collect();
        encoder
            .put_nullable_str_array(8, &nicknames)?
            .put_long_array(9, &value.history)?
            .put_float_array(10, &value.weights)?
            .put_map(11, &value.attributes)?;
        if let Some(best) = &value.best {
            encoder.put_object(12, best, &ItemAdapter)?;
        }
        let roles: Vec<u32> = value.roles.iter().map(|r| r.ordinal()).collect();
        encoder
            .put_nullable_object_array(13, &value.friends, &ItemAdapter)?
            .put_bool_array(14, &value.flags)?
            .put_enum_array(15, &roles)?
            .put_compact_int_array(16, &value.visits)?
            .put_compact_double_array(17, &value.ratings)?;
        Ok(())
    }
}

impl UnpackAdapter<Profile> for ProfileAdapter {
    fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<Profile, DecodeError> {
        let roles = decoder
            .get_enum_array(15)?
            .unwrap_or_default()
            .into_iter()
            .map(|ordinal| Role::from_ordinal(ordinal).unwrap_or(Role::Guest))
            .collect();
        Ok(Profile {
            id: decoder.get_long(0)?.unwrap_or_default(),
            name: decoder.get_str(1)?.unwrap_or_default().to_owned(),
            age: decoder.get_int(2)?.unwrap_or_default(),
            verified: decoder.get_bool(3)?.unwrap_or_default(),
            balance: decoder.get_c_double(4)?.unwrap_or_default(),
            offset: decoder.get_sint(5)?.unwrap_or_default(),
            avatar: decoder.get_bytes(6)?.unwrap_or_default().to_vec(),
            tags: decoder
                .get_str_array(7)?
                .unwrap_or_default()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            nicknames: decoder
                .get_nullable_str_array(8)?
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.map(str::to_owned))
                .collect(),
            history: decoder.get_long_array(9)?.unwrap_or_default(),
            weights: decoder.get_float_array(10)?.unwrap_or_default(),
            attributes: decoder.get_map(11)?.unwrap_or_default(),
            best: decoder.get_object(12, &ItemAdapter)?,
            friends: decoder
                .get_nullable_object_array(13, &ItemAdapter)?
                .unwrap_or_default(),
            flags: decoder.get_bool_array(14)?.unwrap_or_default(),
            roles,
            visits: decoder.get_compact_int_array(16)?.unwrap_or_default(),
            ratings: decoder.get_compact_double_array(17)?.unwrap_or_default(),
        })
    }
}

#[must_use]
pub fn sample_data() -> Data {
    Data {
        msg: Some("message".to_owned()),
        items: Some(vec![Item::new(100, 200)]),
    }
}

/// A deterministic profile whose collections hold `n` elements each.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn sample_profile(n: usize) -> Profile {
    let roles = [Role::Guest, Role::Member, Role::Admin];
    Profile {
        id: 9_000_000_000 + n as i64,
        name: format!("user-{n}"),
        age: 33,
        verified: n % 2 == 0,
        balance: 1024.5,
        offset: -12,
        avatar: (0..n).map(|i| (i * 31) as u8).collect(),
        tags: (0..n).map(|i| format!("tag{i}")).collect(),
        nicknames: (0..n)
            .map(|i| (i % 3 != 0).then(|| format!("nick{i}")))
            .collect(),
        history: (0..n).map(|i| (i as i64) * 1_000_003 - 7).collect(),
        weights: (0..n).map(|i| i as f32 * 0.25).collect(),
        attributes: (0..n).map(|i| (format!("k{i:04}"), i as i64 - 5)).collect(),
        best: Some(Item::new(1, -1)),
        friends: (0..n)
            .map(|i| (i % 4 != 1).then(|| Item::new(i as i32, (i as i64) << 33)))
            .collect(),
        flags: (0..n).map(|i| i % 5 < 2).collect(),
        roles: (0..n).map(|i| roles[i % 3]).collect(),
        visits: (0..n).map(|i| if i % 4 == 0 { 0 } else { (i * i) as i32 }).collect(),
        ratings: (0..n).map(|i| (i % 11) as f64 * 0.5).collect(),
    }
}
