use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{AppDump, AppStore, EngineError, EngineResult, KvEngine};

type Personas = BTreeMap<String, BTreeMap<String, AppStore>>;

/// In-process engine over ordered maps.
///
/// Every operation takes the lock once, so single-key operations and
/// `move_and_set` are atomic and `dump_app` is a consistent snapshot.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    personas: RwLock<Personas>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn take(personas: &mut Personas, persona: &str, app: &str, key: &str) -> EngineResult<Value> {
    let apps = personas
        .get_mut(persona)
        .ok_or(EngineError::PersonaNotFound)?;
    let store = apps.get_mut(app).ok_or(EngineError::AppNotFound)?;
    let value = store.remove(key).ok_or(EngineError::KeyNotFound)?;
    prune(personas, persona, app);
    Ok(value)
}

fn put(personas: &mut Personas, persona: &str, app: &str, key: &str, value: Value) {
    personas
        .entry(persona.to_string())
        .or_default()
        .entry(app.to_string())
        .or_default()
        .insert(key.to_string(), value);
}

// drop empty app / persona maps so dumps only list personas holding data
fn prune(personas: &mut Personas, persona: &str, app: &str) {
    if let Some(apps) = personas.get_mut(persona) {
        if apps.get(app).is_some_and(|s| s.is_empty()) {
            apps.remove(app);
        }
        if apps.is_empty() {
            personas.remove(persona);
        }
    }
}

#[async_trait]
impl KvEngine for MemoryEngine {
    async fn get(&self, persona: &str, app: &str, key: &str) -> EngineResult<Value> {
        let personas = self.personas.read().await;
        let apps = personas.get(persona).ok_or(EngineError::PersonaNotFound)?;
        let store = apps.get(app).ok_or(EngineError::AppNotFound)?;
        store.get(key).cloned().ok_or(EngineError::KeyNotFound)
    }

    async fn set(&self, persona: &str, app: &str, key: &str, value: Value) -> EngineResult<()> {
        let mut personas = self.personas.write().await;
        put(&mut personas, persona, app, key, value);
        Ok(())
    }

    async fn delete(&self, persona: &str, app: &str, key: &str) -> EngineResult<()> {
        let mut personas = self.personas.write().await;
        if let Some(store) = personas.get_mut(persona).and_then(|a| a.get_mut(app)) {
            store.remove(key);
        }
        prune(&mut personas, persona, app);
        Ok(())
    }

    async fn move_key(&self, src: &str, dst: &str, app: &str, key: &str) -> EngineResult<()> {
        let mut personas = self.personas.write().await;
        let value = take(&mut personas, src, app, key)?;
        put(&mut personas, dst, app, key, value);
        Ok(())
    }

    async fn get_global(&self, app: &str, key: &str) -> EngineResult<(Value, String)> {
        let personas = self.personas.read().await;
        personas
            .iter()
            .find_map(|(persona, apps)| {
                apps.get(app)
                    .and_then(|store| store.get(key))
                    .map(|value| (value.clone(), persona.clone()))
            })
            .ok_or(EngineError::KeyNotFound)
    }

    async fn get_app_store(&self, persona: &str, app: &str) -> EngineResult<AppStore> {
        let personas = self.personas.read().await;
        let apps = personas.get(persona).ok_or(EngineError::PersonaNotFound)?;
        apps.get(app).cloned().ok_or(EngineError::AppNotFound)
    }

    async fn dump_app(&self, app: &str) -> EngineResult<AppDump> {
        let personas = self.personas.read().await;
        Ok(personas
            .iter()
            .filter_map(|(persona, apps)| apps.get(app).map(|s| (persona.clone(), s.clone())))
            .collect())
    }

    async fn move_and_set(
        &self,
        src: &str,
        dst: &str,
        app: &str,
        key: &str,
        value: Value,
    ) -> EngineResult<()> {
        let mut personas = self.personas.write().await;
        take(&mut personas, src, app, key)?;
        put(&mut personas, dst, app, key, value);
        Ok(())
    }
}
