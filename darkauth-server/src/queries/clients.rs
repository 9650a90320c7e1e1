use darkauth_types::client::{Client, ClientType, TokenEndpointAuthMethod, ZkDelivery};

use crate::{db::DbPool, error::ApiResult};

pub async fn get(pool: &DbPool, client_id: &str) -> ApiResult<Client> {
    let client = sqlx::query_as!(
        Client,
        r#"
        select
            client_id, name,
            client_type as "client_type: ClientType",
            token_endpoint_auth_method as "token_endpoint_auth_method: TokenEndpointAuthMethod",
            client_secret_enc, require_pkce, redirect_uris, post_logout_redirect_uris,
            grant_types, response_types, scopes,
            zk_delivery as "zk_delivery: ZkDelivery",
            zk_required, allowed_zk_origins, id_token_lifetime_seconds
        from clients where client_id = $1
        "#,
        client_id,
    )
    .fetch_one(pool)
    .await?;
    Ok(client)
}

pub async fn list(pool: &DbPool) -> ApiResult<Vec<Client>> {
    let clients = sqlx::query_as!(
        Client,
        r#"
        select
            client_id, name,
            client_type as "client_type: ClientType",
            token_endpoint_auth_method as "token_endpoint_auth_method: TokenEndpointAuthMethod",
            client_secret_enc, require_pkce, redirect_uris, post_logout_redirect_uris,
            grant_types, response_types, scopes,
            zk_delivery as "zk_delivery: ZkDelivery",
            zk_required, allowed_zk_origins, id_token_lifetime_seconds
        from clients order by name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(clients)
}

pub async fn insert(pool: &DbPool, client: &Client) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into clients
            (client_id, name, client_type, token_endpoint_auth_method, client_secret_enc,
             require_pkce, redirect_uris, post_logout_redirect_uris, grant_types,
             response_types, scopes, zk_delivery, zk_required, allowed_zk_origins,
             id_token_lifetime_seconds)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
        client.client_id,
        client.name,
        client.client_type as ClientType,
        client.token_endpoint_auth_method as TokenEndpointAuthMethod,
        client.client_secret_enc,
        client.require_pkce,
        &client.redirect_uris,
        &client.post_logout_redirect_uris,
        &client.grant_types,
        &client.response_types,
        &client.scopes,
        client.zk_delivery as ZkDelivery,
        client.zk_required,
        &client.allowed_zk_origins,
        client.id_token_lifetime_seconds,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(pool: &DbPool, client: &Client) -> ApiResult<()> {
    sqlx::query!(
        r#"
        update clients set
            name = $2,
            client_type = $3,
            token_endpoint_auth_method = $4,
            client_secret_enc = $5,
            require_pkce = $6,
            redirect_uris = $7,
            post_logout_redirect_uris = $8,
            grant_types = $9,
            response_types = $10,
            scopes = $11,
            zk_delivery = $12,
            zk_required = $13,
            allowed_zk_origins = $14,
            id_token_lifetime_seconds = $15
        where client_id = $1
        "#,
        client.client_id,
        client.name,
        client.client_type as ClientType,
        client.token_endpoint_auth_method as TokenEndpointAuthMethod,
        client.client_secret_enc,
        client.require_pkce,
        &client.redirect_uris,
        &client.post_logout_redirect_uris,
        &client.grant_types,
        &client.response_types,
        &client.scopes,
        client.zk_delivery as ZkDelivery,
        client.zk_required,
        &client.allowed_zk_origins,
        client.id_token_lifetime_seconds,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &DbPool, client_id: &str) -> ApiResult<()> {
    sqlx::query!("delete from clients where client_id = $1", client_id)
        .execute(pool)
        .await?;
    Ok(())
}
