// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-facing bot messages.

pub fn welcome(first_name: &str) -> String {
    format!(
        "Hola {first_name}!

Welcome to WeRise Bot!

WeRise is a platform that helps you manage your crowd funding campaign. Anyone can create a campaign and raise funds for their cause.

If you want to create a campaign, please click /verify to verify your identity.

Donators can donate without verifying their identity or creating an account.

For more information and help center, please click /help
"
    )
}

/// `/start` from an already registered user.
pub fn welcome_back(first_name: &str) -> String {
    format!(
        "Hola {first_name}!

Welcome back to WeRise Bot!

What can I help you with today?

For more information and help center, please click /help
"
    )
}

pub const HELP: &str = "WeRise Bot Help Center

/start - Start the bot.
/help - Help center.
/about - About WeRise Bot.

/create_campaign - Create a campaign.
/my_campaigns - List all your campaigns.

/verify - Verify your identity.
/donate - Donate to a campaign.

/withdraw - Withdraw funds from your campaign.
/withdraw_history - List all your withdraws.

/contact - Contact us.

/privacy - Terms and conditions.
/delete_account - Delete your account.
";

pub const VERIFY_EXPLAINER: &str = "Our verification process is very simple. Please follow the steps below.

1. Click the Verify button below.
2. It will take you to our website where you agree to our terms and conditions.
3. Upload your identity card and selfie.
4. Wait for our team to verify your identity.
5. Once verified, you can create campaigns and withdraw funds.

If you have any questions, please click /contact
";

/// Label of the inline button carrying the verification link.
pub const VERIFY_BUTTON: &str = "Verify💳";

pub const PRIVATE_CHAT_ONLY: &str = "Please use this command in private chat.";

pub fn documents_received(first_name: &str) -> String {
    format!(
        "Dear {first_name},

We want to inform you that we have received your documents and we are currently verifying your identity.

We will notify you once your identity is verified.

Thank you for your patience.
Team WeRise
"
    )
}

pub const LINK_EXPIRED: &str =
    "Your verification link has expired or is invalid. Please send /verify to get a new one.";

pub const SUBMISSION_FAILED: &str =
    "Sorry, we could not process your documents. Please try sending them again.";

pub const UNKNOWN_COMMAND: &str = "Sorry, I don't know that command. Send /help to see what I can do.";

pub const NOT_REGISTERED: &str = "You don't have an account yet. Send /start to create one.";

pub const ACCOUNT_DELETED: &str =
    "Your account has been deleted. Send /start if you ever want to come back.";

pub fn admin_token(token: &str) -> String {
    format!("Review API token (valid for 1 hour):\n\n{token}")
}

pub fn verification_approved(first_name: &str) -> String {
    format!(
        "Dear {first_name},

Your identity has been verified. You can now create campaigns and withdraw funds.

Team WeRise
"
    )
}

pub fn verification_rejected(first_name: &str, reason: &str) -> String {
    format!(
        "Dear {first_name},

We could not verify your identity.

Reason: {reason}

Please send /verify to submit your documents again.

Team WeRise
"
    )
}
