// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rule target wire types.
//!
//! On the wire a rule carries a `ruleType` string and an untyped `target`
//! object. [`RuleTarget`] is the closed set of shapes the client understands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Message encoding used when delivering to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Msgpack,
}

/// Extra HTTP header sent with each delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// How AWS targets authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authenticationMode", rename_all = "camelCase")]
pub enum AwsAuthentication {
    /// Static credentials. The secret is never echoed back.
    #[serde(rename_all = "camelCase")]
    Credentials {
        access_key_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
    },
    /// Cross-account role assumption.
    #[serde(rename_all = "camelCase")]
    AssumeRole { assume_role_arn: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsKinesisTarget {
    pub region: String,
    pub stream_name: String,
    pub partition_key: String,
    pub authentication: AwsAuthentication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsSqsTarget {
    pub region: String,
    pub aws_account_id: String,
    pub queue_name: String,
    pub authentication: AwsAuthentication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsLambdaTarget {
    pub region: String,
    pub function_name: String,
    pub authentication: AwsAuthentication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
}

/// Shared shape of the Zapier and Cloudflare Worker targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTarget {
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authenticationMode", rename_all = "camelCase")]
pub enum PulsarAuthentication {
    /// JWT token. Never echoed back.
    Token {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulsarTarget {
    pub routing_key: String,
    pub topic: String,
    pub service_url: String,
    #[serde(default)]
    pub tls_trust_certs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<PulsarAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTarget {
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IftttTarget {
    pub webhook_key: String,
    pub event_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureFunctionTarget {
    pub azure_app_id: String,
    pub azure_function_name: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCloudFunctionTarget {
    pub region: String,
    pub project_id: String,
    pub function_name: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaslMechanism {
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "scram-sha-256")]
    ScramSha256,
    #[serde(rename = "scram-sha-512")]
    ScramSha512,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaSasl {
    pub mechanism: SaslMechanism,
    pub username: String,
    /// Never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaAuth {
    pub sasl: KafkaSasl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaTarget {
    pub routing_key: String,
    pub brokers: Vec<String>,
    pub auth: KafkaAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmqpTarget {
    pub queue_id: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmqpExternalTarget {
    /// Broker URL including credentials. Never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub routing_key: String,
    #[serde(default)]
    pub mandatory_route: bool,
    #[serde(default)]
    pub persistent_messages: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ttl: Option<u32>,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoIngressTarget {
    /// Connection string. Never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub database: String,
    pub collection: String,
    pub pipeline: String,
    pub full_document: String,
    pub full_document_before_change: String,
    pub primary_site: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresOutboxIngressTarget {
    /// Connection string. Never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub outbox_table_schema: String,
    pub outbox_table_name: String,
    pub nodes_table_schema: String,
    pub nodes_table_name: String,
    pub ssl_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_root_cert: Option<String>,
    pub primary_site: String,
}

/// Typed rule target, one case per rule type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    AwsKinesis(AwsKinesisTarget),
    AwsSqs(AwsSqsTarget),
    AwsLambda(AwsLambdaTarget),
    Zapier(WebhookTarget),
    CloudflareWorker(WebhookTarget),
    Pulsar(PulsarTarget),
    Http(HttpTarget),
    Ifttt(IftttTarget),
    AzureFunction(AzureFunctionTarget),
    GoogleCloudFunction(GoogleCloudFunctionTarget),
    Kafka(KafkaTarget),
    Amqp(AmqpTarget),
    AmqpExternal(AmqpExternalTarget),
    MongoIngress(MongoIngressTarget),
    PostgresOutboxIngress(PostgresOutboxIngressTarget),
}

impl RuleTarget {
    /// The `ruleType` string for this target.
    pub fn rule_type(&self) -> &'static str {
        match self {
            RuleTarget::AwsKinesis(_) => "aws/kinesis",
            RuleTarget::AwsSqs(_) => "aws/sqs",
            RuleTarget::AwsLambda(_) => "aws/lambda",
            RuleTarget::Zapier(_) => "http/zapier",
            RuleTarget::CloudflareWorker(_) => "http/cloudflare-worker",
            RuleTarget::Pulsar(_) => "pulsar",
            RuleTarget::Http(_) => "http",
            RuleTarget::Ifttt(_) => "http/ifttt",
            RuleTarget::AzureFunction(_) => "http/azure-function",
            RuleTarget::GoogleCloudFunction(_) => "http/google-cloud-function",
            RuleTarget::Kafka(_) => "kafka",
            RuleTarget::Amqp(_) => "amqp",
            RuleTarget::AmqpExternal(_) => "amqp/external",
            RuleTarget::MongoIngress(_) => "ingress/mongodb",
            RuleTarget::PostgresOutboxIngress(_) => "ingress-postgres-outbox",
        }
    }

    /// Encode the target object.
    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            RuleTarget::AwsKinesis(t) => serde_json::to_value(t),
            RuleTarget::AwsSqs(t) => serde_json::to_value(t),
            RuleTarget::AwsLambda(t) => serde_json::to_value(t),
            RuleTarget::Zapier(t) | RuleTarget::CloudflareWorker(t) => serde_json::to_value(t),
            RuleTarget::Pulsar(t) => serde_json::to_value(t),
            RuleTarget::Http(t) => serde_json::to_value(t),
            RuleTarget::Ifttt(t) => serde_json::to_value(t),
            RuleTarget::AzureFunction(t) => serde_json::to_value(t),
            RuleTarget::GoogleCloudFunction(t) => serde_json::to_value(t),
            RuleTarget::Kafka(t) => serde_json::to_value(t),
            RuleTarget::Amqp(t) => serde_json::to_value(t),
            RuleTarget::AmqpExternal(t) => serde_json::to_value(t),
            RuleTarget::MongoIngress(t) => serde_json::to_value(t),
            RuleTarget::PostgresOutboxIngress(t) => serde_json::to_value(t),
        }?;
        Ok(value)
    }

    /// Copy of the target with write-only secrets removed.
    ///
    /// This is the shape the server echoes back, and the only shape that is
    /// safe to log.
    pub fn redacted(&self) -> RuleTarget {
        let mut target = self.clone();
        match &mut target {
            RuleTarget::AwsKinesis(t) => redact_aws(&mut t.authentication),
            RuleTarget::AwsSqs(t) => redact_aws(&mut t.authentication),
            RuleTarget::AwsLambda(t) => redact_aws(&mut t.authentication),
            RuleTarget::Pulsar(t) => {
                if let Some(PulsarAuthentication::Token { token }) = &mut t.authentication {
                    *token = None;
                }
            }
            RuleTarget::Kafka(t) => t.auth.sasl.password = None,
            RuleTarget::AmqpExternal(t) => t.url = None,
            RuleTarget::MongoIngress(t) => t.url = None,
            RuleTarget::PostgresOutboxIngress(t) => t.url = None,
            RuleTarget::Zapier(_)
            | RuleTarget::CloudflareWorker(_)
            | RuleTarget::Http(_)
            | RuleTarget::Ifttt(_)
            | RuleTarget::AzureFunction(_)
            | RuleTarget::GoogleCloudFunction(_)
            | RuleTarget::Amqp(_) => {}
        }
        target
    }

    /// Decode a target object given its `ruleType`.
    pub fn from_parts(rule_type: &str, target: Value) -> Result<Self> {
        let decoded = match rule_type {
            "aws/kinesis" => RuleTarget::AwsKinesis(serde_json::from_value(target)?),
            "aws/sqs" => RuleTarget::AwsSqs(serde_json::from_value(target)?),
            "aws/lambda" => RuleTarget::AwsLambda(serde_json::from_value(target)?),
            "http/zapier" => RuleTarget::Zapier(serde_json::from_value(target)?),
            "http/cloudflare-worker" => RuleTarget::CloudflareWorker(serde_json::from_value(target)?),
            "pulsar" => RuleTarget::Pulsar(serde_json::from_value(target)?),
            "http" => RuleTarget::Http(serde_json::from_value(target)?),
            "http/ifttt" => RuleTarget::Ifttt(serde_json::from_value(target)?),
            "http/azure-function" => RuleTarget::AzureFunction(serde_json::from_value(target)?),
            "http/google-cloud-function" => {
                RuleTarget::GoogleCloudFunction(serde_json::from_value(target)?)
            }
            "kafka" => RuleTarget::Kafka(serde_json::from_value(target)?),
            "amqp" => RuleTarget::Amqp(serde_json::from_value(target)?),
            "amqp/external" => RuleTarget::AmqpExternal(serde_json::from_value(target)?),
            "ingress/mongodb" => RuleTarget::MongoIngress(serde_json::from_value(target)?),
            "ingress-postgres-outbox" => {
                RuleTarget::PostgresOutboxIngress(serde_json::from_value(target)?)
            }
            other => {
                return Err(ApiError::UnexpectedResponse(format!(
                    "unknown rule type '{}'",
                    other
                )));
            }
        };
        Ok(decoded)
    }
}

fn redact_aws(auth: &mut AwsAuthentication) {
    if let AwsAuthentication::Credentials {
        secret_access_key, ..
    } = auth
    {
        *secret_access_key = None;
    }
}
