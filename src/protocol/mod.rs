//! Avro [protocols](https://avro.apache.org/docs/current/specification/#protocol-declaration):
//! a set of named types, and messages that refer to them
//!
//! All the types of a protocol, as well as the request, response and error
//! schemas of its messages, live in the same [`Schema`] arena, so that
//! messages can refer to the protocol's types by [`SchemaKey`].

use crate::schema::{
	parsing::{raw, SchemaConstructionState},
	Name, RegularType, Schema, SchemaError, SchemaKey,
};

use std::collections::{BTreeMap, HashSet};

/// An Avro protocol
#[derive(Clone, Debug)]
pub struct Protocol {
	/// Name of the protocol, including its namespace
	///
	/// Types declared without a namespace inherit this one.
	pub name: Name,
	#[allow(missing_docs)]
	pub doc: Option<String>,
	/// The arena all the protocol's schemas are stored in
	pub schema: Schema,
	/// The named types declared by the protocol, in declaration order
	pub types: Vec<SchemaKey>,
	/// Messages, by name
	pub messages: BTreeMap<String, Message>,
}

/// A message of a [`Protocol`]
#[derive(Clone, Debug)]
pub struct Message {
	#[allow(missing_docs)]
	pub doc: Option<String>,
	/// Parameters of the request, in order
	pub request: Vec<Parameter>,
	/// Schema of the response
	pub response: SchemaKey,
	/// Error types this message may answer with (each should be an
	/// [`error`](crate::schema::Record::is_error) record)
	pub errors: Vec<SchemaKey>,
	/// One-way messages have no response (`null`) and no errors
	pub one_way: bool,
}

/// A named parameter of a [`Message`] request
#[derive(Clone, Debug)]
pub struct Parameter {
	#[allow(missing_docs)]
	pub name: String,
	#[allow(missing_docs)]
	pub type_: SchemaKey,
}

impl Protocol {
	/// The full name of the protocol
	pub fn full_name(&self) -> &str {
		self.name.fully_qualified_name()
	}

	#[allow(missing_docs)]
	pub fn namespace(&self) -> Option<&str> {
		self.name.namespace()
	}

	#[allow(missing_docs)]
	pub fn message(&self, name: &str) -> Option<&Message> {
		self.messages.get(name)
	}

	/// The declared type with the given full name
	pub fn type_named(&self, full_name: &str) -> Option<SchemaKey> {
		self.types.iter().copied().find(|&key| {
			self.schema
				.at(key)
				.ok()
				.and_then(|schema_ref| schema_ref.name())
				.is_some_and(|name| name.fully_qualified_name() == full_name)
		})
	}

	/// Check that the protocol is consistent
	///
	/// - The schema arena is [valid](Schema::validate)
	/// - One-way messages have a `null` response and no errors
	/// - Errors are `error` records
	/// - Request parameters that refer to named types refer to types that the
	///   protocol declares
	///
	/// This is called when parsing already.
	pub fn validate(&self) -> Result<(), SchemaError> {
		if !self.schema.nodes().is_empty() {
			self.schema.validate()?;
		}
		let declared: HashSet<SchemaKey> = self
			.types
			.iter()
			.map(|&key| self.schema.at(key).map(|schema_ref| schema_ref.regular_key()))
			.collect::<Result<_, _>>()?;
		for (message_name, message) in &self.messages {
			if message.one_way
				&& (!self.schema.at(message.response)?.is_null() || !message.errors.is_empty())
			{
				return Err(SchemaError::msg(format_args!(
					"One-way message {message_name} must have a null response and no errors"
				)));
			}
			for &error in &message.errors {
				let error = self.schema.at(error)?;
				if !matches!(error.regular(), RegularType::Record(record) if record.is_error) {
					return Err(SchemaError::msg(format_args!(
						"Message {message_name} declares {error} as error, which is not an error record"
					)));
				}
			}
			for parameter in &message.request {
				let type_ = self.schema.at(parameter.type_)?;
				if type_.name().is_some() && !declared.contains(&type_.regular_key()) {
					return Err(SchemaError::msg(format_args!(
						"Parameter {} of message {message_name} refers to {type_}, which is not \
							declared by protocol {}",
						parameter.name, self.name
					)));
				}
			}
		}
		Ok(())
	}

	/// Move the protocol to another namespace
	///
	/// Every named type of the protocol whose namespace is, or is nested
	/// under, the former namespace of the protocol is moved along.
	pub fn set_namespace(&mut self, namespace: Option<&str>) -> Result<(), SchemaError> {
		let new_name = Name::new(self.name.name(), namespace)?;
		let roots: Vec<SchemaKey> = self
			.types
			.iter()
			.copied()
			.chain(self.messages.values().flat_map(|message| {
				message
					.request
					.iter()
					.map(|parameter| parameter.type_)
					.chain(std::iter::once(message.response))
					.chain(message.errors.iter().copied())
			}))
			.collect();
		if !roots.is_empty() {
			self.schema
				.rewrite_namespace_from(&roots, self.name.namespace(), new_name.namespace())?;
		}
		self.name = new_name;
		Ok(())
	}
}

#[derive(serde_derive::Deserialize)]
struct RawProtocol {
	protocol: String,
	namespace: Option<String>,
	doc: Option<String>,
	#[serde(default)]
	types: Vec<raw::SchemaNode>,
	#[serde(default)]
	messages: BTreeMap<String, RawMessage>,
}

#[derive(serde_derive::Deserialize)]
struct RawMessage {
	doc: Option<String>,
	#[serde(default)]
	request: Vec<RawParameter>,
	response: raw::SchemaNode,
	#[serde(default)]
	errors: Vec<raw::SchemaNode>,
	#[serde(default, rename = "one-way")]
	one_way: bool,
}

#[derive(serde_derive::Deserialize)]
struct RawParameter {
	name: String,
	#[serde(rename = "type")]
	type_: raw::SchemaNode,
}

impl std::str::FromStr for Protocol {
	type Err = SchemaError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let raw: RawProtocol = serde_json::from_str(s).map_err(SchemaError::serde_json)?;
		let name = match raw.protocol.rsplit_once('.') {
			Some((namespace, name)) => Name::new(name, Some(namespace))?,
			None => Name::new(&raw.protocol, raw.namespace.as_deref())?,
		};
		let namespace = name.namespace();

		let mut state = SchemaConstructionState::new();
		let types = raw
			.types
			.iter()
			.map(|type_| state.register_node(type_, namespace))
			.collect::<Result<Vec<_>, _>>()?;
		let messages = raw
			.messages
			.into_iter()
			.map(|(message_name, message)| {
				let request = message
					.request
					.into_iter()
					.map(|parameter| {
						Ok::<_, SchemaError>(Parameter {
							type_: state.register_node(&parameter.type_, namespace)?,
							name: parameter.name,
						})
					})
					.collect::<Result<Vec<_>, _>>()?;
				let response = state.register_node(&message.response, namespace)?;
				let errors = message
					.errors
					.iter()
					.map(|error| state.register_node(error, namespace))
					.collect::<Result<Vec<_>, _>>()?;
				Ok::<_, SchemaError>((
					message_name,
					Message {
						doc: message.doc,
						request,
						response,
						errors,
						one_way: message.one_way,
					},
				))
			})
			.collect::<Result<Vec<_>, _>>()?;

		// References may only be resolved once everything is registered
		let types = types
			.into_iter()
			.map(|key| state.resolved_key(key))
			.collect::<Result<Vec<_>, _>>()?;
		let messages = messages
			.into_iter()
			.map(|(message_name, mut message)| {
				for parameter in &mut message.request {
					parameter.type_ = state.resolved_key(parameter.type_)?;
				}
				message.response = state.resolved_key(message.response)?;
				for error in &mut message.errors {
					*error = state.resolved_key(*error)?;
				}
				Ok::<_, SchemaError>((message_name, message))
			})
			.collect::<Result<BTreeMap<_, _>, _>>()?;

		let protocol = Protocol {
			schema: state.finish()?,
			name,
			doc: raw.doc,
			types,
			messages,
		};
		protocol.validate()?;
		tracing::debug!(
			protocol = protocol.full_name(),
			n_types = protocol.types.len(),
			n_messages = protocol.messages.len(),
			"Parsed protocol"
		);
		Ok(protocol)
	}
}
