//! Data-access object over a [`StorageSession`] holding bson documents.

use bson::oid::ObjectId;
use bson::{Bson, Document as BsonDocument};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::counting::total_items;
use super::translate::{to_filter, to_find_options};
use super::validate::{is_safe, validate};
use super::{BaseServiceDao, EntityLifecycleListener, NoOpListener, PersistentServiceDao, ServiceDao};
use crate::config::DaoConfig;
use crate::dsl::{ParsedField, ServiceQuery, ServiceQueryInfo};
use crate::entity::{Entity, from_document, to_document};
use crate::errors::{DslError, Result};
use crate::index::{IndexDescriptor, IndexKey};
use crate::metrics::{LogStatsReporter, NoOpStatsReporter, StatsReporter, StatsTimer, shape_key};
use crate::query::{Filter, FindOptions, UpdateDoc};
use crate::results::{EntityList, EntityMultimap, EntityResult};
use crate::schema::registry::index_info;
use crate::schema::{
    DocumentFieldMapper, EntityDescriptor, EntityFieldMapper, EntityIndexInfo, EntityInfo, FieldType,
    KeyOrder, descriptor_of, entity_info, storage_path,
};
use crate::session::StorageSession;

pub struct DocumentServiceDao<E: Entity> {
    session: Arc<dyn StorageSession>,
    mapper: Arc<dyn EntityFieldMapper>,
    descriptor: Arc<EntityDescriptor>,
    info: EntityInfo,
    index_info: Arc<EntityIndexInfo>,
    collection: String,
    allow_group_by: bool,
    reporter: Arc<dyn StatsReporter>,
    listener: Arc<dyn EntityLifecycleListener<E>>,
}

impl<E: Entity> DocumentServiceDao<E> {
    /// Create the collection with the entity's declared indexes and load the
    /// index metadata (cached per entity type for the process lifetime).
    ///
    /// # Errors
    /// ENTITY_ERROR when the entity has no id; DUPLICATE_KEY when stored data
    /// violates a declared unique index.
    pub fn new(session: Arc<dyn StorageSession>) -> Result<Self> {
        Self::with_mapper(session, Arc::new(DocumentFieldMapper))
    }

    /// # Errors
    /// See [`new`](Self::new).
    pub fn with_mapper(session: Arc<dyn StorageSession>, mapper: Arc<dyn EntityFieldMapper>) -> Result<Self> {
        let descriptor = descriptor_of::<E>();
        let info = entity_info::<E>(mapper.as_ref())?;
        let collection = descriptor.collection_name().to_string();
        let declared = declared_indexes(mapper.as_ref(), &descriptor)?;
        session.ensure_collection(&collection, &declared)?;
        let index_info = index_info::<E, _>(|| {
            let stored = session.index_descriptors(&collection)?;
            Ok(EntityIndexInfo::from_storage(mapper.as_ref(), &descriptor, &stored))
        })?;
        Ok(Self {
            session,
            mapper,
            descriptor,
            info,
            index_info,
            collection,
            allow_group_by: false,
            reporter: Arc::new(NoOpStatsReporter),
            listener: Arc::new(NoOpListener),
        })
    }

    /// # Errors
    /// See [`new`](Self::new).
    pub fn from_config(session: Arc<dyn StorageSession>, config: &DaoConfig) -> Result<Self> {
        let mut dao = Self::new(session)?.allow_group_by(config.allow_group_by);
        if let Some(slow_ms) = config.slow_query_ms {
            dao = dao.with_stats_reporter(Arc::new(LogStatsReporter::new(slow_ms)));
        }
        Ok(dao)
    }

    /// GroupBy runs one storage query per value and is off by default.
    #[must_use]
    pub fn allow_group_by(mut self, allowed: bool) -> Self {
        self.allow_group_by = allowed;
        self
    }

    #[must_use]
    pub fn with_stats_reporter(mut self, reporter: Arc<dyn StatsReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn EntityLifecycleListener<E>>) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn entity_info(&self) -> &EntityInfo {
        &self.info
    }

    #[must_use]
    pub fn index_info(&self) -> &EntityIndexInfo {
        &self.index_info
    }

    #[must_use]
    pub fn field_mapper(&self) -> &dyn EntityFieldMapper {
        self.mapper.as_ref()
    }

    #[must_use]
    pub fn descriptor(&self) -> &Arc<EntityDescriptor> {
        &self.descriptor
    }

    fn timer(&self, query: &ServiceQuery) -> StatsTimer {
        StatsTimer::start(Arc::clone(&self.reporter), shape_key(&self.collection, query.query_shape()))
    }

    fn filter(&self, query: &ServiceQuery) -> Result<Filter> {
        to_filter(self.mapper.as_ref(), &self.descriptor, &self.info.id_storage_name, query)
    }

    fn fetch(&self, query: &ServiceQuery, filter: &Filter, opts: &FindOptions) -> Result<Vec<E>> {
        if query.is_count_only() {
            return Ok(Vec::new());
        }
        log::debug!("executing query on '{}': {filter:?} {opts:?}", self.collection);
        self.session
            .find(&self.collection, filter, opts)?
            .into_iter()
            .map(from_document)
            .collect()
    }

    fn page(&self, query: &ServiceQuery, opts: &FindOptions) -> Result<EntityList<E>> {
        let filter = self.filter(query)?;
        let items = self.fetch(query, &filter, opts)?;
        let total = total_items(query, items.len(), || self.session.count(&self.collection, &filter))?;
        Ok(EntityList::new(items, total))
    }

    fn grouped(&self, query: &ServiceQuery, group_by: &str, opts: &FindOptions) -> Result<EntityResult<E>> {
        if !self.allow_group_by {
            return Err(DslError::query(format!(
                "GroupBy is not allowed by this dao, but request contains groupBy '{group_by}'. \
                 GroupBy can be enabled in the Service"
            )));
        }
        let key = ParsedField::new(group_by);
        let values = query.criteria().get(&key).map(<[_]>::to_vec).unwrap_or_default();
        let mut groups = BTreeMap::new();
        for value in values {
            let narrowed = query.narrowed(&key, value.clone());
            groups.insert(value.render(), self.page(&narrowed, opts)?);
        }
        let total = if query.count_total_items() {
            Some(self.session.count(&self.collection, &self.filter(query)?)?)
        } else {
            None
        };
        Ok(EntityResult::Multimap(EntityMultimap::new(groups, total)))
    }

    fn id_filter(&self, id: &Bson) -> Filter {
        Filter::eq(&self.info.id_storage_name, id.clone())
    }

    /// Give id-less documents a fresh ObjectId where the id type allows it.
    fn ensure_id(&self, doc: &mut BsonDocument) -> Result<()> {
        if self.mapper.id_value(&self.descriptor, doc)?.is_some() {
            return Ok(());
        }
        match self.info.id_type {
            FieldType::ObjectId => {
                doc.insert(self.info.id_storage_name.clone(), ObjectId::new());
                Ok(())
            }
            _ => Err(DslError::entity(format!(
                "Id must be provided for entities of {}",
                self.descriptor.name
            ))),
        }
    }
}

fn declared_indexes(mapper: &dyn EntityFieldMapper, root: &Arc<EntityDescriptor>) -> Result<Vec<IndexDescriptor>> {
    root.indexes
        .iter()
        .map(|spec| {
            let keys = spec
                .keys
                .iter()
                .map(|(name, order)| {
                    let path = storage_path(mapper, root, name)?;
                    Ok(match order {
                        KeyOrder::Asc => IndexKey::asc(&path),
                        KeyOrder::Desc => IndexKey::desc(&path),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(IndexDescriptor::from_keys(keys, spec.unique))
        })
        .collect()
}

impl<E: Entity> ServiceDao<E> for DocumentServiceDao<E> {
    fn get(&self, query: &ServiceQuery) -> Result<EntityResult<E>> {
        self.validate_query(query)?;
        let opts = to_find_options(self.mapper.as_ref(), &self.descriptor, query)?;
        let _timer = self.timer(query);
        match query.group_by() {
            Some(group_by) => self.grouped(query, group_by, &opts),
            None => Ok(EntityResult::List(self.page(query, &opts)?)),
        }
    }

    fn get_one(&self, query: &ServiceQuery) -> Result<Option<E>> {
        self.validate_query(query)?;
        let mut opts = to_find_options(self.mapper.as_ref(), &self.descriptor, query)?;
        opts.limit = Some(1);
        let filter = self.filter(query)?;
        let _timer = self.timer(query);
        Ok(self.fetch(query, &filter, &opts)?.into_iter().next())
    }

    fn count(&self, query: &ServiceQuery) -> Result<u64> {
        self.validate_query(query)?;
        let filter = self.filter(query)?;
        let _timer = self.timer(query);
        self.session.count(&self.collection, &filter)
    }

    fn validate_query(&self, query: &ServiceQuery) -> Result<()> {
        validate(&self.index_info, &self.descriptor.name, query)
    }

    fn describe(&self, query: &ServiceQuery) -> ServiceQueryInfo {
        ServiceQueryInfo::new(query.clone(), is_safe(&self.index_info, query))
    }
}

impl<E: Entity> BaseServiceDao<E> for DocumentServiceDao<E> {
    fn delete_by_id(&self, id: &Bson) -> Result<u64> {
        self.session.delete(&self.collection, &self.id_filter(id), true)
    }
}

impl<E: Entity> PersistentServiceDao<E> for DocumentServiceDao<E> {
    fn save(&self, mut entity: E) -> Result<E> {
        self.listener.pre_persist(&mut entity)?;
        let mut doc = to_document(&entity)?;
        self.ensure_id(&mut doc)?;
        let inserted = self.session.save(&self.collection, doc.clone())?;
        log::debug!("saved entity into '{}' (inserted: {inserted})", self.collection);
        from_document(doc)
    }

    fn patch(&self, query: &ServiceQuery, changes: &BTreeMap<String, Bson>) -> Result<Option<E>> {
        let mut update = UpdateDoc::default();
        for (field, value) in changes {
            let path = storage_path(self.mapper.as_ref(), &self.descriptor, field)?;
            match value {
                Bson::Null => update.unset.push(path),
                v => update.set.push((path, v.clone())),
            }
        }
        self.validate_query(query)?;
        self.listener.pre_update(query, &mut update)?;
        let filter = self.filter(query)?;
        self.session
            .update_first(&self.collection, &filter, &update)?
            .map(from_document)
            .transpose()
    }

    fn delete(&self, query: &ServiceQuery) -> Result<u64> {
        if query.criteria().is_empty() && query.ids().is_none() {
            return Err(DslError::query("Deletion query should either provide ids or criteria"));
        }
        self.validate_query(query)?;
        self.listener.pre_delete(query)?;
        let filter = self.filter(query)?;
        let _timer = self.timer(query);
        self.session.delete(&self.collection, &filter, false)
    }
}
