// Shared fixtures: entity types and DAOs over a fresh in-memory engine.
#![allow(dead_code)]

use bson::oid::ObjectId;
use restdsl::schema::{EntityDescriptor, FieldType};
use restdsl::{DocumentServiceDao, Engine, Entity, PersistentServiceDao, StorageSession};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub name: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
}

impl Entity for Account {
    fn descriptor() -> EntityDescriptor {
        let mention = EntityDescriptor::embedded("Mention")
            .field("name", FieldType::String)
            .field("score", FieldType::Long);
        EntityDescriptor::new("Account", "accounts")
            .id("id", FieldType::Long)
            .field("rating", FieldType::Long)
            .field("nickname", FieldType::String)
            .field("status", FieldType::String)
            .field("mentions", FieldType::list_of(FieldType::object(mention)))
            .index(&["rating"])
            .index(&["status", "rating"])
    }
}

impl Account {
    pub fn new(id: i64, rating: i64) -> Self {
        Self { id: Some(id), rating: Some(rating), ..Self::default() }
    }

    pub fn nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn mention(mut self, name: &str, score: i64) -> Self {
        self.mentions.push(Mention { name: name.to_string(), score });
        self
    }
}

/// Entity with a unique login and a string id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub login: String,
}

impl Entity for Handle {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("Handle", "handles")
            .id("id", FieldType::String)
            .field("login", FieldType::String)
            .unique_index(&["login"])
    }
}

/// Entity whose id is generated on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub text: String,
}

impl Entity for Note {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("Note", "notes").id("id", FieldType::ObjectId).field("text", FieldType::String)
    }
}

pub fn engine() -> Arc<dyn StorageSession> {
    Arc::new(Engine::new())
}

pub fn dao<E: Entity>() -> DocumentServiceDao<E> {
    DocumentServiceDao::<E>::new(engine()).unwrap()
}

/// Accounts 0..n with rating = id, stored in id order.
pub fn seeded_accounts(n: i64) -> DocumentServiceDao<Account> {
    let dao = dao::<Account>();
    for i in 0..n {
        dao.save(Account::new(i, i)).unwrap();
    }
    dao
}

pub fn ids(items: impl IntoIterator<Item = Account>) -> Vec<i64> {
    items.into_iter().filter_map(|a| a.id).collect()
}
