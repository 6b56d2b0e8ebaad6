//! MongoDB-backed todo storage.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{NewTodo, Todo, TodoRepository, TodoUpdate};
use crate::config::TODO_COLLECTION;
use crate::error::AppError;

/// Stored shape of a todo
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default)]
    completed: bool,
}

impl From<TodoDocument> for Todo {
    fn from(document: TodoDocument) -> Self {
        Self {
            id: document.id.to_hex(),
            title: document.title,
            completed: document.completed,
        }
    }
}

fn object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidTodoId(id.to_string()))
}

/// `$set` document for the fields present in `update`
fn set_fields(update: TodoUpdate) -> Document {
    let mut fields = Document::new();
    if let Some(title) = update.title {
        fields.insert("title", title);
    }
    if let Some(completed) = update.completed {
        fields.insert("completed", completed);
    }
    fields
}

/// Todo repository over the `todos` collection
#[derive(Clone)]
pub struct MongoTodoRepository {
    collection: Collection<TodoDocument>,
}

impl MongoTodoRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(TODO_COLLECTION),
        }
    }
}

#[async_trait]
impl TodoRepository for MongoTodoRepository {
    async fn list(&self) -> Result<Vec<Todo>, AppError> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<TodoDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Todo::from).collect())
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError> {
        let document = TodoDocument {
            id: ObjectId::new(),
            title: todo.title,
            completed: todo.completed,
        };
        self.collection.insert_one(&document).await?;
        tracing::debug!(id = %document.id, "Created todo");
        Ok(document.into())
    }

    async fn get(&self, id: &str) -> Result<Option<Todo>, AppError> {
        let id = object_id(id)?;
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(document.map(Todo::from))
    }

    async fn update(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>, AppError> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let id = object_id(id)?;
        let document = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set_fields(update) })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(document.map(Todo::from))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let id = object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
