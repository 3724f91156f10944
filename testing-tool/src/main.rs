use colored::*;
use serde_json::{json, Value};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "🚗 Fleet Inventory Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let base_url = std::env::var("FLEET_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    // Paso 1: comprobar que el servidor responde
    check_health(&client, &base_url).await?;

    // Paso 2: credenciales y token
    let credentials = get_credentials()?;
    let token = authenticate(&client, &base_url, &credentials).await?;

    // Paso 3: menú principal
    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 👤 Usuario actual");
        println!("2. 📊 Panel de vencimientos");
        println!("3. 🚗 Listar vehículos");
        println!("4. 🛠️ Listar equipos");
        println!("5. 📚 Tablas de referencia");
        println!("6. 🚪 Cerrar sesión y salir");
        print!("{}", "Selecciona una opción (1-6): ".bright_yellow());
        io::stdout().flush()?;

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;

        match choice.trim() {
            "1" => get_and_print(&client, &base_url, &token, "/api/auth/me").await?,
            "2" => get_and_print(&client, &base_url, &token, "/api/dashboard").await?,
            "3" => get_and_print(&client, &base_url, &token, "/api/cars?per_page=5").await?,
            "4" => get_and_print(&client, &base_url, &token, "/api/equipment?per_page=5").await?,
            "5" => get_and_print(&client, &base_url, &token, "/api/lookups").await?,
            "6" => {
                logout(&client, &base_url, &token).await?;
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
            }
        }
    }

    Ok(())
}

async fn check_health(client: &reqwest::Client, base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.get(format!("{}/health", base_url)).send().await?;
    let status = response.status();
    let body: Value = response.json().await?;

    if status.is_success() {
        println!("{} {}", "✅ Servidor disponible:".bright_green(), body["version"]);
        Ok(())
    } else {
        Err(format!("❌ /health respondió {}", status).into())
    }
}

fn prompt(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn get_credentials() -> Result<Credentials, Box<dyn std::error::Error>> {
    println!("{}", "🔐 CREDENCIALES".bright_cyan().bold());
    println!("{}", "===============".bright_cyan());

    Ok(Credentials {
        username: prompt("Username: ")?,
        password: prompt("Password: ")?,
    })
}

async fn authenticate(
    client: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<String, Box<dyn std::error::Error>> {
    println!();
    println!("{}", "🔐 AUTENTICANDO...".bright_cyan().bold());

    let response = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({
            "username": credentials.username,
            "password": credentials.password,
        }))
        .send()
        .await?;

    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        println!("{} {}", "❌ Login rechazado:".bright_red(), status);
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Err("❌ No se pudo iniciar sesión".into());
    }

    match body["data"]["token"].as_str() {
        Some(token) => {
            println!("{}", "✅ Sesión iniciada".bright_green().bold());
            println!("   {} {}", "Tipo:".bright_blue(), body["data"]["user"]["user_type"]);
            Ok(token.to_string())
        }
        None => Err("❌ La respuesta no contiene token".into()),
    }
}

async fn get_and_print(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("{} {}", "📤 GET".bright_blue(), path);

    let response = client
        .get(format!("{}{}", base_url, path))
        .bearer_auth(token)
        .send()
        .await?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        println!("{} {}", "📥".bright_green(), status);
    } else {
        println!("{} {}", "📥".bright_red(), status);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn logout(client: &reqwest::Client, base_url: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/api/auth/logout", base_url))
        .bearer_auth(token)
        .send()
        .await?;

    if !response.status().is_success() {
        println!("{} {}", "⚠️ Logout respondió".bright_yellow(), response.status());
    }
    Ok(())
}

#[derive(Debug)]
struct Credentials {
    username: String,
    password: String,
}
