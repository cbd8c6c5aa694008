//! Webhook delivery payloads.

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub source: Option<Source>,
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub id: String,
    pub text: Option<String>,
}

/// A text message event with everything the dispatcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage<'a> {
    pub reply_token: &'a str,
    pub user_id: &'a str,
    pub text: &'a str,
}

impl Event {
    /// `Some` only for text messages carrying a reply token and a user id.
    #[must_use]
    pub fn text_message(&self) -> Option<TextMessage<'_>> {
        if self.event_type != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.msg_type != "text" {
            return None;
        }
        Some(TextMessage {
            reply_token: self.reply_token.as_deref()?,
            user_id: self.source.as_ref()?.user_id.as_deref()?,
            text: message.text.as_deref()?,
        })
    }
}

pub fn parse_events(body: &[u8]) -> Result<Vec<Event>> {
    let body: WebhookBody = serde_json::from_slice(body)?;
    Ok(body.events)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DELIVERY: &str = r#"{
      "destination": "Ubot",
      "events": [
        {
          "type": "message",
          "replyToken": "rt-1",
          "timestamp": 1700000000000,
          "source": { "type": "user", "userId": "U123" },
          "message": { "type": "text", "id": "m1", "text": "gemini" }
        },
        {
          "type": "message",
          "replyToken": "rt-2",
          "source": { "type": "user", "userId": "U123" },
          "message": { "type": "sticker", "id": "m2", "packageId": "1", "stickerId": "2" }
        },
        {
          "type": "follow",
          "replyToken": "rt-3",
          "source": { "type": "user", "userId": "U456" }
        },
        {
          "type": "unfollow",
          "source": { "type": "user", "userId": "U789" }
        }
      ]
    }"#;

    #[test]
    fn only_text_messages_are_extracted() {
        let events = parse_events(DELIVERY.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);

        let texts: Vec<_> = events.iter().filter_map(Event::text_message).collect();
        assert_eq!(
            texts,
            vec![TextMessage {
                reply_token: "rt-1",
                user_id: "U123",
                text: "gemini",
            }]
        );
    }

    #[test]
    fn empty_delivery_parses() {
        let events = parse_events(br#"{"destination":"Ubot","events":[]}"#).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn malformed_delivery_is_an_error() {
        assert!(parse_events(b"not json").is_err());
        assert!(parse_events(br#"{"events":[{"replyToken":"x"}]}"#).is_err());
    }

    #[test]
    fn group_message_without_user_id_is_skipped() {
        let body = br#"{"events":[{"type":"message","replyToken":"rt",
            "source":{"type":"group","groupId":"G1"},
            "message":{"type":"text","id":"1","text":"hi"}}]}"#;
        let events = parse_events(body).unwrap();
        assert!(events[0].text_message().is_none());
    }
}
