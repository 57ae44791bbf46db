//! Message bodies for every email the arcade sends.

use super::OutgoingEmail;

fn email(to: &str, to_name: Option<&str>, subject: &str, text: String, html: String) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        to_name: to_name.map(str::to_string),
        subject: subject.to_string(),
        text,
        html,
    }
}

/// Second-factor code sent after a correct password.
pub fn two_factor_code(to: &str, username: &str, code: &str) -> OutgoingEmail {
    let text = format!(
        "Yo!\n\nWelcome back, {username}! Here's your game code:\n\n\
         Your Code: {code}\n\n\
         It expires in a few minutes. If you didn't request this, someone knows your password: change it.\n\n\
         Stay awesome,\nThe Gang HQ"
    );
    let html = format!(
        "<h2>Yo, {username}!</h2>\
         <p>Here's your game code:</p>\
         <h3 style=\"color: red;\">Your Code: <b>{code}</b></h3>\
         <p>It expires in a few minutes. If you didn't request this, someone knows your password: change it.</p>\
         <p>Stay awesome,<br><b>The Gang HQ</b></p>"
    );
    email(to, Some(username), "Gang Gang Gang - Game Code", text, html)
}

/// Password reset link.
pub fn password_reset(to: &str, reset_link: &str) -> OutgoingEmail {
    let text = format!(
        "Hey!\n\nWe got a request to reset your password. Open the link below to reset it:\n\n\
         {reset_link}\n\nIf you didn't request this, just ignore this email.\n\n\
         Stay awesome,\nThe Gang HQ"
    );
    let html = format!(
        "<h2>Hey!</h2>\
         <p>We got a request to reset your password. Click the link below to reset it:</p>\
         <p><a href=\"{reset_link}\">Reset your password</a></p>\
         <p>If you didn't request this, just ignore this email.</p>\
         <p>Stay awesome,<br><b>The Gang HQ</b></p>"
    );
    email(to, None, "Gang Gang Gang - Reset Your Password", text, html)
}

/// Welcome message after a local or Google registration.
pub fn registration_success(to: &str, username: &str) -> OutgoingEmail {
    let text = format!(
        "Yo {username}!\n\nJust wanted to let you know that you successfully registered.\n\n\
         If it wasn't you, change your password right now!\n\nStay safe,\nThe Gang HQ"
    );
    let html = format!(
        "<h2>Yo {username}!</h2>\
         <p>Just wanted to let you know that you successfully registered.</p>\
         <p>If it wasn't you, change your password right now!</p>\
         <p>Stay safe,<br><b>The Gang HQ</b></p>"
    );
    email(to, Some(username), "Gang Gang Gang - Register Successful", text, html)
}

/// Congratulations for finishing first.
pub fn game_achievement(to: &str, username: &str) -> OutgoingEmail {
    let text = format!(
        "Yo {username}!\n\nCongratulations! You secured the first place in the game!\n\n\
         Keep dominating and see you at the top again soon!\n\nStay awesome,\nThe Gang HQ"
    );
    let html = format!(
        "<h2>Yo {username}!</h2>\
         <p>Congratulations! You secured the first place in the game!</p>\
         <p>Keep dominating and see you at the top again soon!</p>\
         <p>Stay awesome,<br><b>The Gang HQ</b></p>"
    );
    email(to, Some(username), "Gang Gang Gang - You're #1!", text, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_factor_code_contains_code() {
        let mail = two_factor_code("a@example.com", "ana", "a1b2c3");
        assert!(mail.text.contains("a1b2c3"));
        assert!(mail.html.contains("a1b2c3"));
        assert_eq!(mail.to_name.as_deref(), Some("ana"));
    }

    #[test]
    fn test_password_reset_contains_link() {
        let mail = password_reset("a@example.com", "https://x.test/change-password?token=t");
        assert!(mail.html.contains("href=\"https://x.test/change-password?token=t\""));
    }
}
