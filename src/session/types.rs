use serde::{Deserialize, Serialize};

/// Profile of the authenticated user as delivered by the service.
///
/// Mutated wholesale on login/signup/profile-update responses, and one field
/// at a time on logo upload/removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: Option<i64>,
  pub email: Option<String>,
  pub full_name: Option<String>,
  pub company_name: Option<String>,
  /// Relative path to the uploaded company logo, e.g. "uploads/logos/user_3_logo.png".
  pub company_logo: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
}

/// Credentials for `login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
  pub email: String,
  pub password: String,
}

/// Registration data for `signup`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupData {
  pub email: String,
  pub password: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

/// Partial profile update; only provided fields are sent.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub email: Option<String>,
  pub password: Option<String>,
  pub full_name: Option<String>,
  pub company_name: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
}

/// A logo image read into memory, ready for multipart upload.
#[derive(Debug, Clone)]
pub struct LogoFile {
  pub file_name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

impl LogoFile {
  /// Read a logo from disk, guessing the content type from the extension.
  pub fn read(path: &std::path::Path) -> std::io::Result<Self> {
    let bytes = std::fs::read(path)?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "logo".to_string());
    let content_type = path
      .extension()
      .and_then(|ext| ext.to_str())
      .and_then(|ext| match ext.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
      })
      .map(String::from);

    Ok(Self {
      file_name,
      content_type,
      bytes,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_profile_roundtrips_through_json() {
    let profile = UserProfile {
      id: Some(1),
      email: Some("a@b.com".to_string()),
      full_name: Some("A".to_string()),
      company_logo: Some("uploads/logos/user_1_logo.png".to_string()),
      ..Default::default()
    };

    let raw = serde_json::to_string(&profile).unwrap();
    let back: UserProfile = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, profile);
  }

  #[test]
  fn test_signup_data_omits_absent_fields() {
    let data = SignupData {
      email: "a@b.com".to_string(),
      password: "x".to_string(),
      ..Default::default()
    };

    let value = serde_json::to_value(&data).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("email"));
    assert!(object.contains_key("password"));
  }
}
