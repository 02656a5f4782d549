// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rule targets as configured, and their translation to and from the wire.
//!
//! [`Target`] is the closed set of destinations a rule can deliver to. Exactly
//! one variant is present by construction. [`to_remote`] and [`from_remote`]
//! are exhaustive matches, so a new variant does not compile until both
//! directions handle it.
//!
//! Secrets the server never echoes (AWS secret keys, the Kafka password, the
//! Pulsar token and connection URLs) are restored from the prior state with
//! [`carry_forward`].

use rtcontrol_api as api;
use rtcontrol_api::{Format, Header, RuleTarget, SaslMechanism};
use serde::{Deserialize, Serialize};

use crate::resource::carry_forward;

/// AWS credentials for Kinesis, SQS and Lambda targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AwsAuth {
    Credentials {
        access_key_id: String,
        /// Write-only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
    },
    AssumeRole {
        assume_role_arn: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinesisTarget {
    pub region: String,
    pub stream_name: String,
    pub partition_key: String,
    pub authentication: AwsAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqsTarget {
    pub region: String,
    pub aws_account_id: String,
    pub queue_name: String,
    pub authentication: AwsAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaTarget {
    pub region: String,
    pub function_name: String,
    pub authentication: AwsAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
}

/// Zapier and Cloudflare Worker targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulsarTarget {
    pub routing_key: String,
    pub topic: String,
    pub service_url: String,
    #[serde(default)]
    pub tls_trust_certs: Vec<String>,
    /// JWT for token authentication. Write-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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
pub struct IftttTarget {
    pub webhook_key: String,
    pub event_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaTarget {
    pub routing_key: String,
    pub brokers: Vec<String>,
    pub mechanism: SaslMechanism,
    pub username: String,
    /// Write-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enveloped: Option<bool>,
    #[serde(default)]
    pub format: Format,
}

/// Delivery into one of the app's own queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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
pub struct AmqpExternalTarget {
    /// Broker URL with credentials. Write-only.
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
pub struct MongoIngressTarget {
    /// Write-only.
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
pub struct PostgresOutboxIngressTarget {
    /// Write-only.
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

/// Where a rule delivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    Kinesis(KinesisTarget),
    Sqs(SqsTarget),
    Lambda(LambdaTarget),
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

impl Target {
    /// Ingress rules pull from an external database and have no channel source.
    pub fn is_ingress(&self) -> bool {
        matches!(
            self,
            Target::MongoIngress(_) | Target::PostgresOutboxIngress(_)
        )
    }
}

/// Translate a configured target into its wire form.
pub fn to_remote(target: &Target) -> RuleTarget {
    match target {
        Target::Kinesis(t) => RuleTarget::AwsKinesis(api::AwsKinesisTarget {
            region: t.region.clone(),
            stream_name: t.stream_name.clone(),
            partition_key: t.partition_key.clone(),
            authentication: aws_to_remote(&t.authentication),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::Sqs(t) => RuleTarget::AwsSqs(api::AwsSqsTarget {
            region: t.region.clone(),
            aws_account_id: t.aws_account_id.clone(),
            queue_name: t.queue_name.clone(),
            authentication: aws_to_remote(&t.authentication),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::Lambda(t) => RuleTarget::AwsLambda(api::AwsLambdaTarget {
            region: t.region.clone(),
            function_name: t.function_name.clone(),
            authentication: aws_to_remote(&t.authentication),
            enveloped: t.enveloped,
        }),
        Target::Zapier(t) => RuleTarget::Zapier(webhook_to_remote(t)),
        Target::CloudflareWorker(t) => RuleTarget::CloudflareWorker(webhook_to_remote(t)),
        Target::Pulsar(t) => RuleTarget::Pulsar(api::PulsarTarget {
            routing_key: t.routing_key.clone(),
            topic: t.topic.clone(),
            service_url: t.service_url.clone(),
            tls_trust_certs: t.tls_trust_certs.clone(),
            authentication: t.token.as_ref().map(|token| api::PulsarAuthentication::Token {
                token: Some(token.clone()),
            }),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::Http(t) => RuleTarget::Http(api::HttpTarget {
            url: t.url.clone(),
            headers: t.headers.clone(),
            signing_key_id: t.signing_key_id.clone(),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::Ifttt(t) => RuleTarget::Ifttt(api::IftttTarget {
            webhook_key: t.webhook_key.clone(),
            event_name: t.event_name.clone(),
        }),
        Target::AzureFunction(t) => RuleTarget::AzureFunction(api::AzureFunctionTarget {
            azure_app_id: t.azure_app_id.clone(),
            azure_function_name: t.azure_function_name.clone(),
            headers: t.headers.clone(),
            signing_key_id: t.signing_key_id.clone(),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::GoogleCloudFunction(t) => {
            RuleTarget::GoogleCloudFunction(api::GoogleCloudFunctionTarget {
                region: t.region.clone(),
                project_id: t.project_id.clone(),
                function_name: t.function_name.clone(),
                headers: t.headers.clone(),
                signing_key_id: t.signing_key_id.clone(),
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        Target::Kafka(t) => RuleTarget::Kafka(api::KafkaTarget {
            routing_key: t.routing_key.clone(),
            brokers: t.brokers.clone(),
            auth: api::KafkaAuth {
                sasl: api::KafkaSasl {
                    mechanism: t.mechanism,
                    username: t.username.clone(),
                    password: t.password.clone(),
                },
            },
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::Amqp(t) => RuleTarget::Amqp(api::AmqpTarget {
            queue_id: t.queue_id.clone(),
            headers: t.headers.clone(),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::AmqpExternal(t) => RuleTarget::AmqpExternal(api::AmqpExternalTarget {
            url: t.url.clone(),
            routing_key: t.routing_key.clone(),
            mandatory_route: t.mandatory_route,
            persistent_messages: t.persistent_messages,
            message_ttl: t.message_ttl,
            headers: t.headers.clone(),
            enveloped: t.enveloped,
            format: t.format,
        }),
        Target::MongoIngress(t) => RuleTarget::MongoIngress(api::MongoIngressTarget {
            url: t.url.clone(),
            database: t.database.clone(),
            collection: t.collection.clone(),
            pipeline: t.pipeline.clone(),
            full_document: t.full_document.clone(),
            full_document_before_change: t.full_document_before_change.clone(),
            primary_site: t.primary_site.clone(),
        }),
        Target::PostgresOutboxIngress(t) => {
            RuleTarget::PostgresOutboxIngress(api::PostgresOutboxIngressTarget {
                url: t.url.clone(),
                outbox_table_schema: t.outbox_table_schema.clone(),
                outbox_table_name: t.outbox_table_name.clone(),
                nodes_table_schema: t.nodes_table_schema.clone(),
                nodes_table_name: t.nodes_table_name.clone(),
                ssl_mode: t.ssl_mode.clone(),
                ssl_root_cert: t.ssl_root_cert.clone(),
                primary_site: t.primary_site.clone(),
            })
        }
    }
}

/// Translate a wire target back, restoring write-only secrets from `prior`.
///
/// `prior` only contributes when it is the same variant.
pub fn from_remote(remote: RuleTarget, prior: Option<&Target>) -> Target {
    match remote {
        RuleTarget::AwsKinesis(t) => {
            let prior = match prior {
                Some(Target::Kinesis(p)) => Some(&p.authentication),
                _ => None,
            };
            Target::Kinesis(KinesisTarget {
                region: t.region,
                stream_name: t.stream_name,
                partition_key: t.partition_key,
                authentication: aws_from_remote(t.authentication, prior),
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::AwsSqs(t) => {
            let prior = match prior {
                Some(Target::Sqs(p)) => Some(&p.authentication),
                _ => None,
            };
            Target::Sqs(SqsTarget {
                region: t.region,
                aws_account_id: t.aws_account_id,
                queue_name: t.queue_name,
                authentication: aws_from_remote(t.authentication, prior),
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::AwsLambda(t) => {
            let prior = match prior {
                Some(Target::Lambda(p)) => Some(&p.authentication),
                _ => None,
            };
            Target::Lambda(LambdaTarget {
                region: t.region,
                function_name: t.function_name,
                authentication: aws_from_remote(t.authentication, prior),
                enveloped: t.enveloped,
            })
        }
        RuleTarget::Zapier(t) => Target::Zapier(webhook_from_remote(t)),
        RuleTarget::CloudflareWorker(t) => Target::CloudflareWorker(webhook_from_remote(t)),
        RuleTarget::Pulsar(t) => {
            let prior = match prior {
                Some(Target::Pulsar(p)) => p.token.as_ref(),
                _ => None,
            };
            let echoed = match t.authentication {
                Some(api::PulsarAuthentication::Token { token }) => token,
                None => None,
            };
            Target::Pulsar(PulsarTarget {
                routing_key: t.routing_key,
                topic: t.topic,
                service_url: t.service_url,
                tls_trust_certs: t.tls_trust_certs,
                token: carry_forward(echoed, prior),
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::Http(t) => Target::Http(HttpTarget {
            url: t.url,
            headers: t.headers,
            signing_key_id: t.signing_key_id,
            enveloped: t.enveloped,
            format: t.format,
        }),
        RuleTarget::Ifttt(t) => Target::Ifttt(IftttTarget {
            webhook_key: t.webhook_key,
            event_name: t.event_name,
        }),
        RuleTarget::AzureFunction(t) => Target::AzureFunction(AzureFunctionTarget {
            azure_app_id: t.azure_app_id,
            azure_function_name: t.azure_function_name,
            headers: t.headers,
            signing_key_id: t.signing_key_id,
            enveloped: t.enveloped,
            format: t.format,
        }),
        RuleTarget::GoogleCloudFunction(t) => {
            Target::GoogleCloudFunction(GoogleCloudFunctionTarget {
                region: t.region,
                project_id: t.project_id,
                function_name: t.function_name,
                headers: t.headers,
                signing_key_id: t.signing_key_id,
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::Kafka(t) => {
            let prior = match prior {
                Some(Target::Kafka(p)) => p.password.as_ref(),
                _ => None,
            };
            let sasl = t.auth.sasl;
            Target::Kafka(KafkaTarget {
                routing_key: t.routing_key,
                brokers: t.brokers,
                mechanism: sasl.mechanism,
                username: sasl.username,
                password: carry_forward(sasl.password, prior),
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::Amqp(t) => Target::Amqp(AmqpTarget {
            queue_id: t.queue_id,
            headers: t.headers,
            enveloped: t.enveloped,
            format: t.format,
        }),
        RuleTarget::AmqpExternal(t) => {
            let prior = match prior {
                Some(Target::AmqpExternal(p)) => p.url.as_ref(),
                _ => None,
            };
            Target::AmqpExternal(AmqpExternalTarget {
                url: carry_forward(t.url, prior),
                routing_key: t.routing_key,
                mandatory_route: t.mandatory_route,
                persistent_messages: t.persistent_messages,
                message_ttl: t.message_ttl,
                headers: t.headers,
                enveloped: t.enveloped,
                format: t.format,
            })
        }
        RuleTarget::MongoIngress(t) => {
            let prior = match prior {
                Some(Target::MongoIngress(p)) => p.url.as_ref(),
                _ => None,
            };
            Target::MongoIngress(MongoIngressTarget {
                url: carry_forward(t.url, prior),
                database: t.database,
                collection: t.collection,
                pipeline: t.pipeline,
                full_document: t.full_document,
                full_document_before_change: t.full_document_before_change,
                primary_site: t.primary_site,
            })
        }
        RuleTarget::PostgresOutboxIngress(t) => {
            let prior = match prior {
                Some(Target::PostgresOutboxIngress(p)) => p.url.as_ref(),
                _ => None,
            };
            Target::PostgresOutboxIngress(PostgresOutboxIngressTarget {
                url: carry_forward(t.url, prior),
                outbox_table_schema: t.outbox_table_schema,
                outbox_table_name: t.outbox_table_name,
                nodes_table_schema: t.nodes_table_schema,
                nodes_table_name: t.nodes_table_name,
                ssl_mode: t.ssl_mode,
                ssl_root_cert: t.ssl_root_cert,
                primary_site: t.primary_site,
            })
        }
    }
}

fn aws_to_remote(auth: &AwsAuth) -> api::AwsAuthentication {
    match auth {
        AwsAuth::Credentials {
            access_key_id,
            secret_access_key,
        } => api::AwsAuthentication::Credentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
        },
        AwsAuth::AssumeRole { assume_role_arn } => api::AwsAuthentication::AssumeRole {
            assume_role_arn: assume_role_arn.clone(),
        },
    }
}

fn aws_from_remote(auth: api::AwsAuthentication, prior: Option<&AwsAuth>) -> AwsAuth {
    match auth {
        api::AwsAuthentication::Credentials {
            access_key_id,
            secret_access_key,
        } => {
            let prior = match prior {
                Some(AwsAuth::Credentials {
                    secret_access_key, ..
                }) => secret_access_key.as_ref(),
                _ => None,
            };
            AwsAuth::Credentials {
                access_key_id,
                secret_access_key: carry_forward(secret_access_key, prior),
            }
        }
        api::AwsAuthentication::AssumeRole { assume_role_arn } => {
            AwsAuth::AssumeRole { assume_role_arn }
        }
    }
}

fn webhook_to_remote(target: &WebhookTarget) -> api::WebhookTarget {
    api::WebhookTarget {
        url: target.url.clone(),
        headers: target.headers.clone(),
        signing_key_id: target.signing_key_id.clone(),
    }
}

fn webhook_from_remote(target: api::WebhookTarget) -> WebhookTarget {
    WebhookTarget {
        url: target.url,
        headers: target.headers,
        signing_key_id: target.signing_key_id,
    }
}
