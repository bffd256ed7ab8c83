//! Product catalog: canonical item records keyed by identifier.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;

use crate::{
   config,
   error::{Error, Result},
   types::{EvalField, ItemId, SENTINEL_ID},
};

/// Canonical record for one catalog item.
#[derive(Debug, Clone)]
pub struct ItemRecord {
   pub id:          ItemId,
   pub title:       String,
   pub description: String,
   /// Newline-joined "name value" attribute lines, when the item has any.
   pub attributes:  Option<String>,
}

impl ItemRecord {
   /// Concatenated text for the chosen similarity field.
   pub fn field_text(&self, field: EvalField) -> String {
      let mut text = format!("{} {}", self.title, self.description);
      if field == EvalField::FullText
         && let Some(attributes) = &self.attributes
      {
         text.push(' ');
         text.push_str(attributes);
      }
      text
   }
}

#[derive(Debug, Deserialize)]
struct TitleRow {
   product_uid:   ItemId,
   product_title: String,
}

#[derive(Debug, Deserialize)]
struct DescriptionRow {
   product_uid:         ItemId,
   product_description: String,
}

// attributes.csv carries blank rows and float-formatted ids
#[derive(Debug, Deserialize)]
struct AttributeRow {
   product_uid: Option<String>,
   name:        Option<String>,
   value:       Option<String>,
}

/// Item records for every product in the labeled dataset.
pub struct Catalog {
   items: HashMap<ItemId, ItemRecord>,
}

impl Catalog {
   /// Loads and joins the three dataset files under `dir`: titles from the
   /// labeled training file (first occurrence per id wins), descriptions,
   /// and per-item attribute lines.
   pub fn load(dir: &Path) -> Result<Self> {
      let titles = load_titles(&dir.join(config::TRAIN_FILE))?;
      let descriptions = load_descriptions(&dir.join(config::DESCRIPTIONS_FILE))?;
      let attributes = load_attributes(&dir.join(config::ATTRIBUTES_FILE))?;

      let mut items = HashMap::with_capacity(titles.len());
      for (id, title) in titles {
         let description = match descriptions.get(&id) {
            Some(description) => description.clone(),
            None => {
               tracing::debug!(id, "no description found for item");
               String::new()
            },
         };

         let record = ItemRecord {
            id,
            title,
            description,
            attributes: attributes.get(&id).map(|lines| lines.join("\n")),
         };
         items.insert(id, record);
      }

      if items.is_empty() {
         return Err(Error::Dataset(format!("no items found under {}", dir.display())));
      }

      tracing::info!(items = items.len(), dir = %dir.display(), "loaded catalog");
      Ok(Self { items })
   }

   /// Looks up an item record. The sentinel id and unknown ids both resolve
   /// to `None`; callers treat absent entries as zero-similarity, never as
   /// an error.
   pub fn resolve(&self, id: ItemId) -> Option<&ItemRecord> {
      if id == SENTINEL_ID {
         return None;
      }
      self.items.get(&id)
   }

   pub fn records(&self) -> impl Iterator<Item = &ItemRecord> {
      self.items.values()
   }

   pub fn len(&self) -> usize {
      self.items.len()
   }

   pub fn is_empty(&self) -> bool {
      self.items.is_empty()
   }

   #[cfg(test)]
   pub(crate) fn from_records(records: Vec<ItemRecord>) -> Self {
      Self { items: records.into_iter().map(|r| (r.id, r)).collect() }
   }
}

fn lossy_records(path: &Path) -> Result<(csv::StringRecord, Vec<csv::StringRecord>)> {
   let mut reader = csv::Reader::from_path(path)?;
   // the dataset ships as ISO-8859-1, not UTF-8
   let headers = csv::StringRecord::from_byte_record_lossy(reader.byte_headers()?.clone());
   let mut records = Vec::new();
   for record in reader.into_byte_records() {
      records.push(csv::StringRecord::from_byte_record_lossy(record?));
   }
   Ok((headers, records))
}

fn load_titles(path: &Path) -> Result<Vec<(ItemId, String)>> {
   let (headers, records) = lossy_records(path)?;

   let mut seen = HashMap::new();
   let mut titles = Vec::new();
   for record in records {
      let row: TitleRow = record.deserialize(Some(&headers))?;
      if seen.insert(row.product_uid, ()).is_none() {
         titles.push((row.product_uid, row.product_title));
      }
   }
   Ok(titles)
}

fn load_descriptions(path: &Path) -> Result<HashMap<ItemId, String>> {
   let (headers, records) = lossy_records(path)?;

   let mut descriptions = HashMap::with_capacity(records.len());
   for record in records {
      let row: DescriptionRow = record.deserialize(Some(&headers))?;
      descriptions.insert(row.product_uid, row.product_description);
   }
   Ok(descriptions)
}

fn load_attributes(path: &Path) -> Result<HashMap<ItemId, Vec<String>>> {
   let (headers, records) = lossy_records(path)?;

   let mut attributes: HashMap<ItemId, Vec<String>> = HashMap::new();
   for record in records {
      let row: AttributeRow = record.deserialize(Some(&headers))?;

      // incomplete rows are dropped, matching the labeled dataset's blanks
      let (Some(uid), Some(name), Some(value)) = (row.product_uid, row.name, row.value) else {
         continue;
      };
      if uid.is_empty() || name.is_empty() || value.is_empty() {
         continue;
      }
      // ids are float-formatted in this file ("100001.0")
      let Ok(id) = uid.parse::<f64>() else {
         continue;
      };
      let id = id as ItemId;
      if id == SENTINEL_ID {
         continue;
      }

      // bullet-point names carry no signal, keep the value alone
      let line = if name.contains("Bullet") {
         value
      } else {
         format!("{name} {value}")
      };
      attributes.entry(id).or_default().push(line);
   }
   Ok(attributes)
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use tempfile::TempDir;

   use super::*;

   fn write_dataset(dir: &TempDir) {
      let mut train = std::fs::File::create(dir.path().join(config::TRAIN_FILE)).unwrap();
      writeln!(train, "id,product_uid,product_title,search_term,relevance").unwrap();
      writeln!(train, "1,101,Red Chair,red chair,3.0").unwrap();
      writeln!(train, "2,101,Red Chair Dup,red chair deluxe,2.0").unwrap();
      writeln!(train, "3,102,Blue Table,blue table,2.5").unwrap();

      let mut descriptions =
         std::fs::File::create(dir.path().join(config::DESCRIPTIONS_FILE)).unwrap();
      writeln!(descriptions, "product_uid,product_description").unwrap();
      writeln!(descriptions, "101,A sturdy red chair.").unwrap();

      let mut attributes = std::fs::File::create(dir.path().join(config::ATTRIBUTES_FILE)).unwrap();
      writeln!(attributes, "product_uid,name,value").unwrap();
      writeln!(attributes, "101.0,Material,Oak").unwrap();
      writeln!(attributes, "101.0,Bullet01,Easy to assemble").unwrap();
      writeln!(attributes, ",,").unwrap();
      writeln!(attributes, "102.0,Color,Blue").unwrap();
   }

   #[test]
   fn load_joins_titles_descriptions_and_attributes() {
      let dir = TempDir::new().unwrap();
      write_dataset(&dir);

      let catalog = Catalog::load(dir.path()).unwrap();
      assert_eq!(catalog.len(), 2);

      let chair = catalog.resolve(101).unwrap();
      // first title occurrence wins
      assert_eq!(chair.title, "Red Chair");
      assert_eq!(chair.description, "A sturdy red chair.");
      assert_eq!(chair.attributes.as_deref(), Some("Material Oak\nEasy to assemble"));

      let table = catalog.resolve(102).unwrap();
      assert_eq!(table.description, "");
      assert_eq!(table.attributes.as_deref(), Some("Color Blue"));
   }

   #[test]
   fn sentinel_and_unknown_ids_are_absent() {
      let dir = TempDir::new().unwrap();
      write_dataset(&dir);

      let catalog = Catalog::load(dir.path()).unwrap();
      assert!(catalog.resolve(0).is_none());
      assert!(catalog.resolve(999).is_none());
   }

   #[test]
   fn field_text_selects_attribute_inclusion() {
      let record = ItemRecord {
         id:          7,
         title:       "Red Chair".to_string(),
         description: "Sturdy.".to_string(),
         attributes:  Some("Material Oak".to_string()),
      };

      assert_eq!(record.field_text(EvalField::TitleDesc), "Red Chair Sturdy.");
      assert_eq!(record.field_text(EvalField::FullText), "Red Chair Sturdy. Material Oak");

      let bare = ItemRecord { attributes: None, ..record };
      assert_eq!(bare.field_text(EvalField::FullText), "Red Chair Sturdy.");
   }
}
